//! Module content sessions: stepping through sections, unlocking the quiz,
//! and persisting checkpoints along the way.

mod service;
mod view;
mod workflow;

pub use service::ModuleSession;
pub use view::{SectionView, SessionView};
pub use workflow::{AdvanceOutcome, SessionWorkflow};
