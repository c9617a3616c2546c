use std::sync::Arc;

use storage::auth::{AuthProvider, InMemoryAuth};
use storage::remote::{RemoteAuth, RemoteConfig, RemoteStore};
use storage::repository::{DeviceCache, Storage};
use storage::sqlite::SqliteRepository;

use crate::Clock;
use crate::error::AppServicesError;
use crate::identity_service::IdentityService;
use crate::overview::OverviewService;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::session::SessionWorkflow;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: ProgressService,
    overview: Arc<OverviewService>,
    sessions: Arc<SessionWorkflow>,
    quizzes: Arc<QuizService>,
    identity: Arc<IdentityService>,
}

impl AppServices {
    fn assemble(storage: &Storage, clock: Clock, auth: Arc<dyn AuthProvider>) -> Self {
        let progress = ProgressService::new(Arc::clone(&storage.progress));
        let overview = Arc::new(OverviewService::new(progress.clone()));
        let sessions = Arc::new(SessionWorkflow::new(clock, progress.clone()));
        let quizzes = Arc::new(QuizService::new(clock, progress.clone()));
        let identity = Arc::new(IdentityService::new(
            auth,
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.device_cache),
        ));
        Self {
            progress,
            overview,
            sessions,
            quizzes,
            identity,
        }
    }

    /// Build services backed by local `SQLite` storage.
    ///
    /// Local runs have no hosted auth, so sessions come from an in-memory
    /// provider; pass a real provider via `assemble`-style constructors
    /// when one exists.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(&storage, clock, Arc::new(InMemoryAuth::new())))
    }

    /// Build services against the hosted backend, keeping the device cache
    /// in local `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the local cache database cannot be
    /// opened.
    pub async fn new_remote(
        config: RemoteConfig,
        cache_db_url: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let cache_repo = SqliteRepository::connect(cache_db_url).await?;
        cache_repo.migrate().await?;
        let device_cache: Arc<dyn DeviceCache> = Arc::new(cache_repo);

        let store = RemoteStore::new(config);
        let auth = Arc::new(RemoteAuth::new(store.clone()));
        let storage = Storage::remote(store, device_cache);
        Ok(Self::assemble(&storage, clock, auth))
    }

    /// Everything in memory, for tests and demos.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let storage = Storage::in_memory();
        Self::assemble(&storage, clock, Arc::new(InMemoryAuth::new()))
    }

    #[must_use]
    pub fn progress(&self) -> ProgressService {
        self.progress.clone()
    }

    #[must_use]
    pub fn overview(&self) -> Arc<OverviewService> {
        Arc::clone(&self.overview)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<IdentityService> {
        Arc::clone(&self.identity)
    }
}
