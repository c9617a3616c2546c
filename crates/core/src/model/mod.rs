pub mod badge;
mod ids;
mod module;
mod profile;
mod progress;
mod quiz;

pub use badge::{Badge, BadgeState};
pub use ids::{ModuleKey, ModuleKeyError, UserId};
pub use module::{MediaRef, ModuleError, ModuleOutline, Section};
pub use profile::{Profile, SignupError, SignupField, SignupForm, format_dob};
pub use progress::{ModuleProgress, ModuleStatus, ProgressError};
pub use quiz::{
    AnswerSheet, OptionMark, PASS_MARK, QuizError, QuizOutcome, QuizQuestion, grade, mark_option,
};
