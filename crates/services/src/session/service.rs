use chrono::{DateTime, Utc};
use std::fmt;

use storage::repository::ProgressPatch;
use training_core::model::{ModuleOutline, ModuleProgress, ModuleStatus, UserId};
use training_core::rollup::{READY_FOR_QUIZ_PERCENT, content_percent};

use super::view::{SectionView, SessionView};

//
// ─── MODULE SESSION ────────────────────────────────────────────────────────────
//

/// In-memory reading session for one module.
///
/// Pure state machine over the module outline: it decides where the reader
/// is and which checkpoint patch each advance should persist. Storage and
/// the clock stay outside, in `SessionWorkflow`.
pub struct ModuleSession {
    user_id: UserId,
    outline: ModuleOutline,
    view: SessionView,
    initial_time_spent: u32,
    started_at: DateTime<Utc>,
}

impl ModuleSession {
    /// Open a session on the overview page.
    ///
    /// `started_at` should come from the services layer clock so elapsed
    /// time stays deterministic under test.
    #[must_use]
    pub fn new(
        outline: ModuleOutline,
        progress: &ModuleProgress,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: progress.user_id(),
            outline,
            view: SessionView::Overview,
            initial_time_spent: progress.time_spent(),
            started_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn outline(&self) -> &ModuleOutline {
        &self.outline
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Render data for the current section, when a section is open.
    #[must_use]
    pub fn section_view(&self) -> Option<SectionView<'_>> {
        match self.view {
            SessionView::Section(index) => SectionView::build(&self.outline, index),
            SessionView::Overview | SessionView::Quiz => None,
        }
    }

    /// Seconds on this module so far: the stored total plus session time.
    /// Clamped below at the stored total so a clock running backwards can
    /// never shrink it.
    #[must_use]
    pub fn time_spent(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = now.signed_duration_since(self.started_at).num_seconds();
        let elapsed = u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX);
        self.initial_time_spent.saturating_add(elapsed)
    }

    /// Move one step forward. Entering the first section persists nothing;
    /// every later step returns the checkpoint patch to store.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<ProgressPatch> {
        let total = self.outline.section_count();
        match self.view {
            SessionView::Overview => {
                self.view = SessionView::Section(0);
                None
            }
            SessionView::Section(index) if index + 1 < total => {
                self.view = SessionView::Section(index + 1);
                Some(ProgressPatch {
                    percent: Some(content_percent(index + 1, total)),
                    status: Some(ModuleStatus::InProgress),
                    time_spent: Some(self.time_spent(now)),
                    ..ProgressPatch::default()
                })
            }
            SessionView::Section(_) => {
                self.view = SessionView::Quiz;
                Some(ProgressPatch {
                    percent: Some(READY_FOR_QUIZ_PERCENT),
                    status: Some(ModuleStatus::ReadyForQuiz),
                    time_spent: Some(self.time_spent(now)),
                    ..ProgressPatch::default()
                })
            }
            SessionView::Quiz => None,
        }
    }

    /// Move one step back. Never persists.
    pub fn back(&mut self) {
        self.view = match self.view {
            SessionView::Overview => SessionView::Overview,
            SessionView::Section(0) => SessionView::Overview,
            SessionView::Section(index) => SessionView::Section(index - 1),
            SessionView::Quiz => SessionView::Section(self.outline.section_count() - 1),
        };
    }

    /// A failed quiz drops the reader back on the overview page.
    pub fn return_to_overview(&mut self) {
        self.view = SessionView::Overview;
    }
}

impl fmt::Debug for ModuleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSession")
            .field("module_key", &self.outline.key())
            .field("view", &self.view)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;
    use training_core::model::{ModuleKey, Section};
    use training_core::time::fixed_now;

    fn user() -> UserId {
        UserId::from_str("51f0a9c2-88d4-4f6e-b021-3c4d5e6f7a8b").unwrap()
    }

    fn outline(sections: usize) -> ModuleOutline {
        let sections = (0..sections)
            .map(|i| Section::new(format!("Step {i}"), "Body text.", Vec::new()).unwrap())
            .collect();
        ModuleOutline::new(
            ModuleKey::from_static("residential"),
            "Residential Carpet",
            "How to clean residential carpet.",
            sections,
        )
        .unwrap()
    }

    fn fresh_session(sections: usize) -> ModuleSession {
        let progress = ModuleProgress::not_started(user(), ModuleKey::from_static("residential"));
        ModuleSession::new(outline(sections), &progress, fixed_now())
    }

    #[test]
    fn entering_the_first_section_persists_nothing() {
        let mut session = fresh_session(5);
        assert_eq!(session.view(), SessionView::Overview);
        assert!(session.advance(fixed_now()).is_none());
        assert_eq!(session.view(), SessionView::Section(0));
    }

    #[test]
    fn advancing_to_the_second_of_five_checkpoints_at_32() {
        let mut session = fresh_session(5);
        session.advance(fixed_now());
        let patch = session.advance(fixed_now()).unwrap();
        assert_eq!(patch.percent, Some(32));
        assert_eq!(patch.status, Some(ModuleStatus::InProgress));
        assert_eq!(session.view(), SessionView::Section(1));
    }

    #[test]
    fn finishing_the_last_section_unlocks_the_quiz_at_90() {
        let mut session = fresh_session(2);
        session.advance(fixed_now());
        session.advance(fixed_now());
        let patch = session.advance(fixed_now()).unwrap();
        assert_eq!(patch.percent, Some(90));
        assert_eq!(patch.status, Some(ModuleStatus::ReadyForQuiz));
        assert_eq!(session.view(), SessionView::Quiz);

        // Further advances are inert.
        assert!(session.advance(fixed_now()).is_none());
        assert_eq!(session.view(), SessionView::Quiz);
    }

    #[test]
    fn back_steps_through_sections_to_the_overview() {
        let mut session = fresh_session(3);
        session.advance(fixed_now());
        session.advance(fixed_now());
        assert_eq!(session.view(), SessionView::Section(1));

        session.back();
        assert_eq!(session.view(), SessionView::Section(0));
        session.back();
        assert_eq!(session.view(), SessionView::Overview);
        session.back();
        assert_eq!(session.view(), SessionView::Overview);
    }

    #[test]
    fn time_spent_accumulates_and_never_shrinks() {
        let stored = ModuleProgress::from_persisted(
            user(),
            ModuleKey::from_static("residential"),
            32,
            ModuleStatus::InProgress,
            300,
            None,
            0,
            training_core::model::AnswerSheet::default(),
            None,
        )
        .unwrap();
        let session = ModuleSession::new(outline(5), &stored, fixed_now());

        assert_eq!(session.time_spent(fixed_now() + Duration::seconds(45)), 345);
        // Clock moving backwards keeps the stored floor.
        assert_eq!(session.time_spent(fixed_now() - Duration::seconds(45)), 300);
    }

    #[test]
    fn section_view_labels_position() {
        let mut session = fresh_session(5);
        session.advance(fixed_now());
        session.advance(fixed_now());
        let view = session.section_view().unwrap();
        assert_eq!(view.position_label(), "Section 2 of 5");
        assert!(!view.is_last);
    }
}
