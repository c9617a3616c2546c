//! Text decoding shared by the sqlite and remote adapters.
//!
//! Both backends store ids, statuses, and the answer sheet as text; every
//! decode failure surfaces as `StorageError::Serialization`.

use std::str::FromStr;

use training_core::model::{AnswerSheet, ModuleKey, ModuleStatus, UserId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    UserId::from_str(raw).map_err(ser)
}

pub(crate) fn module_key_from_text(raw: String) -> Result<ModuleKey, StorageError> {
    ModuleKey::new(raw).map_err(ser)
}

pub(crate) fn status_from_text(raw: &str) -> Result<ModuleStatus, StorageError> {
    ModuleStatus::from_str(raw).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<AnswerSheet, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn answers_to_json(answers: &AnswerSheet) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}
