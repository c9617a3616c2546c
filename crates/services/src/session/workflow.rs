use training_core::model::{ModuleOutline, UserId};

use super::service::ModuleSession;
use super::view::SessionView;
use crate::Clock;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

/// Result of one advance, with the persistence outcome attached.
///
/// The local view always moves; `save_failed` is a warning for the caller
/// to surface, not a reason to block the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub view: SessionView,
    pub persisted: bool,
    pub save_failed: bool,
}

/// Orchestrates module sessions against the progress store.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    progress: ProgressService,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressService) -> Self {
        Self { clock, progress }
    }

    /// Open a session for a module, seeding it with the stored progress
    /// (or a fresh row when there is none).
    pub async fn open(&self, user: UserId, outline: ModuleOutline) -> ModuleSession {
        let stored = self.progress.get_progress(user, outline.key()).await;
        ModuleSession::new(outline, &stored, self.clock.now())
    }

    /// Advance the session and persist its checkpoint, if it produced one.
    pub async fn advance(&self, session: &mut ModuleSession) -> AdvanceOutcome {
        let now = self.clock.now();
        let user = session.user_id();
        let key = session.outline().key().clone();

        let Some(patch) = session.advance(now) else {
            return AdvanceOutcome {
                view: session.view(),
                persisted: false,
                save_failed: false,
            };
        };

        let save_failed = self.progress.save_progress(user, &key, &patch).await.is_err();
        AdvanceOutcome {
            view: session.view(),
            persisted: !save_failed,
            save_failed,
        }
    }

    /// Step back without touching the store.
    pub fn back(&self, session: &mut ModuleSession) -> SessionView {
        session.back();
        session.view()
    }

    /// Guard for handing the session off to the quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizLocked` until the last section was read.
    pub fn quiz_view(&self, session: &ModuleSession) -> Result<(), SessionError> {
        if session.view() == SessionView::Quiz {
            Ok(())
        } else {
            Err(SessionError::QuizLocked)
        }
    }
}
