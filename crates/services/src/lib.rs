#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod identity_service;
pub mod overview;
pub mod progress_service;
pub mod quiz_service;
pub mod session;

pub use training_core::Clock;

pub use app_services::AppServices;
pub use error::{IdentityError, ProgressServiceError, QuizServiceError, SessionError};
pub use identity_service::{IdentityService, ResolvedIdentity};
pub use overview::{ModuleCard, OverviewService};
pub use progress_service::ProgressService;
pub use quiz_service::{QuizRoute, QuizService, QuizSubmission};
pub use session::{AdvanceOutcome, ModuleSession, SessionView, SessionWorkflow};
