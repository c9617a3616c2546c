use thiserror::Error;

use crate::model::{ModuleError, ModuleKeyError, ProgressError, QuizError, SignupError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Key(#[from] ModuleKeyError),
    #[error(transparent)]
    Signup(#[from] SignupError),
}
