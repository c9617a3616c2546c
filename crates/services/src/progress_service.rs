//! Per-user training progress reads and writes.
//!
//! Reads never fail the caller: a missing row, a malformed row, or an
//! unreachable backend all surface as a fresh `not_started` value so the
//! training screens always have something to render. Writes do fail loudly;
//! callers decide whether a lost save blocks the flow.

use std::collections::HashMap;
use std::sync::Arc;

use storage::repository::{ProgressPatch, ProgressRepository};
use training_core::model::{ModuleKey, ModuleProgress, UserId};

use crate::error::ProgressServiceError;

#[derive(Clone)]
pub struct ProgressService {
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }

    /// Progress for one module, defaulting to `not_started` when the row is
    /// missing, malformed, or unreachable.
    pub async fn get_progress(&self, user: UserId, key: &ModuleKey) -> ModuleProgress {
        match self.progress.fetch(user, key).await {
            Ok(Some(record)) => record
                .into_progress()
                .unwrap_or_else(|_| ModuleProgress::not_started(user, key.clone())),
            Ok(None) | Err(_) => ModuleProgress::not_started(user, key.clone()),
        }
    }

    /// Progress for a set of modules. The result holds exactly the requested
    /// keys: stored rows where they exist, `not_started` everywhere else,
    /// including when the whole fetch fails.
    pub async fn get_progress_bulk(
        &self,
        user: UserId,
        keys: &[ModuleKey],
    ) -> HashMap<ModuleKey, ModuleProgress> {
        let mut out: HashMap<ModuleKey, ModuleProgress> = keys
            .iter()
            .map(|key| (key.clone(), ModuleProgress::not_started(user, key.clone())))
            .collect();

        if let Ok(records) = self.progress.fetch_many(user, keys).await {
            for record in records {
                let key = record.module_key.clone();
                if !out.contains_key(&key) {
                    continue;
                }
                if let Ok(progress) = record.into_progress() {
                    out.insert(key, progress);
                }
            }
        }

        out
    }

    /// Persist a field-granular update for one module row.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the write fails; the
    /// stored row is then unchanged.
    pub async fn save_progress(
        &self,
        user: UserId,
        key: &ModuleKey,
        patch: &ProgressPatch,
    ) -> Result<(), ProgressServiceError> {
        self.progress.upsert(user, key, patch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use storage::repository::InMemoryRepository;
    use training_core::model::ModuleStatus;

    fn user() -> UserId {
        UserId::from_str("7c1f4b6e-2d3a-4e8f-9b10-aa55cc77ee99").unwrap()
    }

    fn service(repo: &InMemoryRepository) -> ProgressService {
        ProgressService::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn missing_row_reads_as_not_started() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo)
            .get_progress(user(), &ModuleKey::from_static("duct"))
            .await;
        assert_eq!(progress.percent(), 0);
        assert_eq!(progress.status(), ModuleStatus::NotStarted);
    }

    #[tokio::test]
    async fn unreachable_backend_reads_as_not_started() {
        let repo = InMemoryRepository::new();
        repo.set_offline(true);
        let progress = service(&repo)
            .get_progress(user(), &ModuleKey::from_static("duct"))
            .await;
        assert_eq!(progress.status(), ModuleStatus::NotStarted);
    }

    #[tokio::test]
    async fn bulk_result_covers_exactly_the_requested_keys() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let rugs = ModuleKey::from_static("rugs");
        svc.save_progress(
            user(),
            &rugs,
            &ProgressPatch {
                percent: Some(90),
                status: Some(ModuleStatus::ReadyForQuiz),
                ..ProgressPatch::default()
            },
        )
        .await
        .unwrap();

        let keys = vec![
            ModuleKey::from_static("residential"),
            rugs.clone(),
            ModuleKey::from_static("stairs"),
        ];
        let map = svc.get_progress_bulk(user(), &keys).await;
        assert_eq!(map.len(), 3);
        assert_eq!(map[&rugs].percent(), 90);
        assert_eq!(
            map[&ModuleKey::from_static("stairs")].status(),
            ModuleStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn bulk_fetch_failure_default_fills_every_key() {
        let repo = InMemoryRepository::new();
        repo.set_offline(true);
        let keys = vec![
            ModuleKey::from_static("floor"),
            ModuleKey::from_static("duct"),
        ];
        let map = service(&repo).get_progress_bulk(user(), &keys).await;
        assert_eq!(map.len(), 2);
        assert!(map.values().all(|p| p.status() == ModuleStatus::NotStarted));
    }
}
