use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::quiz::AnswerSheet;
use crate::model::{ModuleKey, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("percent {0} is out of range (0..=100)")]
    PercentOutOfRange(i64),

    #[error("quiz score {0} is out of range (0..=100)")]
    ScoreOutOfRange(i64),

    #[error("unknown module status: {raw:?}")]
    UnknownStatus { raw: String },
}

/// Persisted lifecycle status of one (user, module) row.
///
/// Distinct from the transient overview/section view the screen holds; only
/// these four values ever reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    ReadyForQuiz,
    Complete,
}

impl ModuleStatus {
    /// Wire/storage spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::NotStarted => "not_started",
            ModuleStatus::InProgress => "in_progress",
            ModuleStatus::ReadyForQuiz => "ready_for_quiz",
            ModuleStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ModuleStatus::NotStarted),
            "in_progress" => Ok(ModuleStatus::InProgress),
            "ready_for_quiz" => Ok(ModuleStatus::ReadyForQuiz),
            "complete" => Ok(ModuleStatus::Complete),
            other => Err(ProgressError::UnknownStatus {
                raw: other.to_string(),
            }),
        }
    }
}

/// One user's progress through one module or submodule.
///
/// The remote row is the source of truth; this type is the validated
/// in-memory image of it. Rows are created implicitly by the first upsert
/// and never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    user_id: UserId,
    module_key: ModuleKey,
    percent: u8,
    status: ModuleStatus,
    time_spent: u32,
    quiz_score: Option<u8>,
    attempts: u32,
    answers: AnswerSheet,
    completed_at: Option<DateTime<Utc>>,
}

impl ModuleProgress {
    /// The default shape returned when no row exists (or a fetch failed).
    #[must_use]
    pub fn not_started(user_id: UserId, module_key: ModuleKey) -> Self {
        Self {
            user_id,
            module_key,
            percent: 0,
            status: ModuleStatus::NotStarted,
            time_spent: 0,
            quiz_score: None,
            attempts: 0,
            answers: AnswerSheet::default(),
            completed_at: None,
        }
    }

    /// Rehydrate a progress row from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if percent or quiz score fall outside 0..=100.
    /// Callers are expected to clamp untrusted percents before this; the
    /// check here guards the constructor itself.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        module_key: ModuleKey,
        percent: u8,
        status: ModuleStatus,
        time_spent: u32,
        quiz_score: Option<u8>,
        attempts: u32,
        answers: AnswerSheet,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if percent > 100 {
            return Err(ProgressError::PercentOutOfRange(i64::from(percent)));
        }
        if let Some(score) = quiz_score {
            if score > 100 {
                return Err(ProgressError::ScoreOutOfRange(i64::from(score)));
            }
        }

        Ok(Self {
            user_id,
            module_key,
            percent,
            status,
            time_spent,
            quiz_score,
            attempts,
            answers,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn module_key(&self) -> &ModuleKey {
        &self.module_key
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    #[must_use]
    pub fn time_spent(&self) -> u32 {
        self.time_spent
    }

    #[must_use]
    pub fn quiz_score(&self) -> Option<u8> {
        self.quiz_score
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == ModuleStatus::Complete
    }

    /// True once the content sections are done and the quiz is unlocked.
    #[must_use]
    pub fn quiz_unlocked(&self) -> bool {
        matches!(
            self.status,
            ModuleStatus::ReadyForQuiz | ModuleStatus::Complete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::new(Uuid::from_u128(7))
    }

    fn key() -> ModuleKey {
        ModuleKey::from_static("residential")
    }

    #[test]
    fn default_row_shape() {
        let row = ModuleProgress::not_started(user(), key());
        assert_eq!(row.percent(), 0);
        assert_eq!(row.status(), ModuleStatus::NotStarted);
        assert_eq!(row.attempts(), 0);
        assert!(row.quiz_score().is_none());
        assert!(row.completed_at().is_none());
        assert!(!row.quiz_unlocked());
    }

    #[test]
    fn from_persisted_validates_ranges() {
        let err = ModuleProgress::from_persisted(
            user(),
            key(),
            101,
            ModuleStatus::InProgress,
            0,
            None,
            0,
            AnswerSheet::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::PercentOutOfRange(101));

        let err = ModuleProgress::from_persisted(
            user(),
            key(),
            90,
            ModuleStatus::ReadyForQuiz,
            0,
            Some(120),
            1,
            AnswerSheet::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::ScoreOutOfRange(120));
    }

    #[test]
    fn completed_row_roundtrip() {
        let row = ModuleProgress::from_persisted(
            user(),
            key(),
            100,
            ModuleStatus::Complete,
            845,
            Some(86),
            2,
            AnswerSheet::default(),
            Some(fixed_now()),
        )
        .unwrap();
        assert!(row.is_complete());
        assert!(row.quiz_unlocked());
        assert_eq!(row.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ModuleStatus::NotStarted,
            ModuleStatus::InProgress,
            ModuleStatus::ReadyForQuiz,
            ModuleStatus::Complete,
        ] {
            assert_eq!(status.as_str().parse::<ModuleStatus>().unwrap(), status);
        }
        assert!("finished".parse::<ModuleStatus>().is_err());
    }
}
