use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use training_core::model::{
    AnswerSheet, ModuleKey, ModuleProgress, ModuleStatus, Profile, UserId,
};
use training_core::rollup::clamp_percent;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Raw persisted shape of a (user, module) progress row.
///
/// Integer fields stay wide and unclamped here; `into_progress` is where
/// untrusted stored values get normalized into the domain type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub module_key: ModuleKey,
    pub percent: i64,
    pub status: ModuleStatus,
    pub time_spent: i64,
    pub quiz_score: Option<i64>,
    pub attempts: i64,
    pub answers: AnswerSheet,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// The implicit row shape before any write has happened.
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

    #[must_use]
    pub fn from_progress(progress: &ModuleProgress) -> Self {
        Self {
            user_id: progress.user_id(),
            module_key: progress.module_key().clone(),
            percent: i64::from(progress.percent()),
            status: progress.status(),
            time_spent: i64::from(progress.time_spent()),
            quiz_score: progress.quiz_score().map(i64::from),
            attempts: i64::from(progress.attempts()),
            answers: progress.answers().clone(),
            completed_at: progress.completed_at(),
        }
    }

    /// Normalize the raw row into the domain type, clamping percents and
    /// scores and flooring negative counters at zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the normalized row still
    /// fails domain validation.
    pub fn into_progress(self) -> Result<ModuleProgress, StorageError> {
        let percent = clamp_percent(self.percent);
        let quiz_score = self.quiz_score.map(clamp_percent);
        let time_spent = u32::try_from(self.time_spent.max(0)).unwrap_or(u32::MAX);
        let attempts = u32::try_from(self.attempts.max(0)).unwrap_or(u32::MAX);

        ModuleProgress::from_persisted(
            self.user_id,
            self.module_key,
            percent,
            self.status,
            time_spent,
            quiz_score,
            attempts,
            self.answers,
            self.completed_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Partial update for one progress row: only `Some` fields are written,
/// everything else keeps its stored value (last-write-wins per field).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub percent: Option<u8>,
    pub status: Option<ModuleStatus>,
    pub time_spent: Option<u32>,
    pub quiz_score: Option<u8>,
    pub attempts: Option<u32>,
    pub answers: Option<AnswerSheet>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge this patch into an existing record in place.
    pub fn apply_to(&self, record: &mut ProgressRecord) {
        if let Some(percent) = self.percent {
            record.percent = i64::from(percent);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(time_spent) = self.time_spent {
            record.time_spent = i64::from(time_spent);
        }
        if let Some(score) = self.quiz_score {
            record.quiz_score = Some(i64::from(score));
        }
        if let Some(attempts) = self.attempts {
            record.attempts = i64::from(attempts);
        }
        if let Some(answers) = &self.answers {
            record.answers = answers.clone();
        }
        if let Some(completed_at) = self.completed_at {
            record.completed_at = Some(completed_at);
        }
    }
}

/// Repository contract for module-progress rows.
///
/// One row per (user, module key); rows are created implicitly by the first
/// upsert and never deleted.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch one row, `Ok(None)` when the row does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport failure.
    async fn fetch(
        &self,
        user: UserId,
        key: &ModuleKey,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Fetch the rows that exist for the given key set. Missing keys are
    /// simply absent from the result; default-filling is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport failure.
    async fn fetch_many(
        &self,
        user: UserId,
        keys: &[ModuleKey],
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Insert-or-merge keyed on (user, key), writing only the patch fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; stored state is then
    /// unchanged.
    async fn upsert(
        &self,
        user: UserId,
        key: &ModuleKey,
        patch: &ProgressPatch,
    ) -> Result<(), StorageError>;
}

/// Repository contract for identity-backed profile rows.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by user id, `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport failure.
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, StorageError>;

    /// Persist or replace a profile row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;
}

/// Cache key for the display-name/email fallback blob.
pub const CACHED_IDENTITY_KEY: &str = "cached_identity";

/// Cache key for profile edits captured before login and applied after.
pub const PENDING_PROFILE_KEY: &str = "pending_profile";

/// Small on-device key-value store holding JSON blobs.
///
/// Strictly a best-effort mirror; the remote store stays the source of
/// truth for anything kept here.
#[async_trait]
pub trait DeviceCache: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be written.
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory repository for tests and prototyping.
///
/// `set_offline(true)` makes every operation fail with a transport error,
/// which is how adapter-level default-filling gets exercised.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<(UserId, ModuleKey), ProgressRecord>>>,
    profiles: Arc<Mutex<HashMap<UserId, Profile>>>,
    cache: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated transport failure for every subsequent call.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Transport("offline".into()))
        } else {
            Ok(())
        }
    }

    fn lock<'a, T>(
        &self,
        mutex: &'a Mutex<T>,
    ) -> Result<std::sync::MutexGuard<'a, T>, StorageError> {
        mutex
            .lock()
            .map_err(|e| StorageError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn fetch(
        &self,
        user: UserId,
        key: &ModuleKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        self.check_online()?;
        let guard = self.lock(&self.progress)?;
        Ok(guard.get(&(user, key.clone())).cloned())
    }

    async fn fetch_many(
        &self,
        user: UserId,
        keys: &[ModuleKey],
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.check_online()?;
        let guard = self.lock(&self.progress)?;
        Ok(keys
            .iter()
            .filter_map(|key| guard.get(&(user, key.clone())).cloned())
            .collect())
    }

    async fn upsert(
        &self,
        user: UserId,
        key: &ModuleKey,
        patch: &ProgressPatch,
    ) -> Result<(), StorageError> {
        self.check_online()?;
        let mut guard = self.lock(&self.progress)?;
        let record = guard
            .entry((user, key.clone()))
            .or_insert_with(|| ProgressRecord::not_started(user, key.clone()));
        patch.apply_to(record);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, StorageError> {
        self.check_online()?;
        let guard = self.lock(&self.profiles)?;
        Ok(guard.get(&user).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.check_online()?;
        let mut guard = self.lock(&self.profiles)?;
        guard.insert(profile.user_id, profile.clone());
        Ok(())
    }
}

#[async_trait]
impl DeviceCache for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        self.check_online()?;
        let guard = self.lock(&self.cache)?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        self.check_online()?;
        let mut guard = self.lock(&self.cache)?;
        guard.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_online()?;
        let mut guard = self.lock(&self.cache)?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub device_cache: Arc<dyn DeviceCache>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            progress: Arc::new(repo.clone()),
            profiles: Arc::new(repo.clone()),
            device_cache: Arc::new(repo),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use training_core::time::fixed_now;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    fn key(raw: &'static str) -> ModuleKey {
        ModuleKey::from_static(raw)
    }

    #[tokio::test]
    async fn upsert_creates_then_merges_fields() {
        let repo = InMemoryRepository::new();
        let residential = key("residential");

        let first = ProgressPatch {
            percent: Some(32),
            status: Some(ModuleStatus::InProgress),
            time_spent: Some(120),
            ..ProgressPatch::default()
        };
        repo.upsert(user(), &residential, &first).await.unwrap();

        // Second patch touches only the score; percent must survive.
        let second = ProgressPatch {
            quiz_score: Some(57),
            attempts: Some(1),
            ..ProgressPatch::default()
        };
        repo.upsert(user(), &residential, &second).await.unwrap();

        let record = repo.fetch(user(), &residential).await.unwrap().unwrap();
        assert_eq!(record.percent, 32);
        assert_eq!(record.status, ModuleStatus::InProgress);
        assert_eq!(record.quiz_score, Some(57));
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn repeated_identical_upsert_is_idempotent() {
        let repo = InMemoryRepository::new();
        let duct = key("duct");
        let patch = ProgressPatch {
            percent: Some(90),
            status: Some(ModuleStatus::ReadyForQuiz),
            ..ProgressPatch::default()
        };

        repo.upsert(user(), &duct, &patch).await.unwrap();
        let first = repo.fetch(user(), &duct).await.unwrap().unwrap();
        repo.upsert(user(), &duct, &patch).await.unwrap();
        let second = repo.fetch(user(), &duct).await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fetch_many_skips_missing_rows() {
        let repo = InMemoryRepository::new();
        let patch = ProgressPatch {
            percent: Some(100),
            status: Some(ModuleStatus::Complete),
            completed_at: Some(fixed_now()),
            ..ProgressPatch::default()
        };
        repo.upsert(user(), &key("residential"), &patch)
            .await
            .unwrap();

        let keys = vec![key("residential"), key("commercial"), key("rugs")];
        let rows = repo.fetch_many(user(), &keys).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].module_key, key("residential"));
    }

    #[tokio::test]
    async fn offline_mode_fails_every_call() {
        let repo = InMemoryRepository::new();
        repo.set_offline(true);
        assert!(repo.fetch(user(), &key("duct")).await.is_err());
        assert!(
            repo.upsert(user(), &key("duct"), &ProgressPatch::default())
                .await
                .is_err()
        );
    }

    #[test]
    fn record_normalizes_out_of_range_values() {
        let mut record = ProgressRecord::not_started(user(), key("duct"));
        record.percent = 250;
        record.quiz_score = Some(-5);
        record.time_spent = -10;
        let progress = record.into_progress().unwrap();
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.quiz_score(), Some(0));
        assert_eq!(progress.time_spent(), 0);
    }
}
