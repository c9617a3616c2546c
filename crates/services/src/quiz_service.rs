//! Quiz grading and submission.
//!
//! Grading itself is pure (`training_core::model::grade`); this service
//! wraps it with the attempt counter and the pass/fail persistence rules.

use training_core::model::{AnswerSheet, ModuleKey, ModuleStatus, QuizOutcome, QuizQuestion, UserId, grade};
use training_core::rollup::{FAILED_QUIZ_PERCENT, PASS_PERCENT};

use crate::Clock;
use crate::error::QuizServiceError;
use crate::progress_service::ProgressService;

/// Where the app goes after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizRoute {
    /// Passed: back to the training grid.
    ReturnToTraining,
    /// Failed: back into the module to review the content.
    ReviewModule,
}

/// A graded, persisted quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub outcome: QuizOutcome,
    pub route: QuizRoute,
    /// Lifetime attempt count for this module, this submission included.
    pub attempts: u32,
}

#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    progress: ProgressService,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressService) -> Self {
        Self { clock, progress }
    }

    /// Grade the sheet and persist the result.
    ///
    /// Attempts accumulate over the stored row, so retakes across app
    /// restarts keep counting. A failed retake of an already-complete
    /// module leaves `completed_at` untouched, since the patch omits it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the result cannot be
    /// persisted; the submission is then not counted.
    pub async fn submit(
        &self,
        user: UserId,
        key: &ModuleKey,
        questions: &[QuizQuestion],
        answers: &AnswerSheet,
        time_spent: u32,
    ) -> Result<QuizSubmission, QuizServiceError> {
        let outcome = grade(questions, answers);
        let stored = self.progress.get_progress(user, key).await;
        let attempts = stored.attempts().saturating_add(1);

        let mut patch = storage::repository::ProgressPatch {
            quiz_score: Some(outcome.score()),
            attempts: Some(attempts),
            answers: Some(answers.clone()),
            time_spent: Some(time_spent),
            ..Default::default()
        };
        let route = if outcome.passed() {
            patch.percent = Some(PASS_PERCENT);
            patch.status = Some(ModuleStatus::Complete);
            patch.completed_at = Some(self.clock.now());
            QuizRoute::ReturnToTraining
        } else {
            patch.percent = Some(FAILED_QUIZ_PERCENT);
            patch.status = Some(ModuleStatus::InProgress);
            QuizRoute::ReviewModule
        };

        self.progress.save_progress(user, key, &patch).await?;

        Ok(QuizSubmission {
            outcome,
            route,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use storage::repository::InMemoryRepository;
    use training_core::time::{fixed_clock, fixed_now};

    fn user() -> UserId {
        UserId::from_str("9d8c7b6a-5e4f-4d3c-b2a1-0f9e8d7c6b5a").unwrap()
    }

    fn questions() -> Vec<QuizQuestion> {
        (0..7)
            .map(|i| {
                QuizQuestion::new(
                    format!("Question {i}"),
                    vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    0,
                )
                .unwrap()
            })
            .collect()
    }

    fn sheet(correct: usize) -> AnswerSheet {
        (0..7u16)
            .map(|i| (i, u16::from(usize::from(i) >= correct)))
            .collect()
    }

    fn service(repo: &InMemoryRepository) -> (QuizService, ProgressService) {
        let progress = ProgressService::new(Arc::new(repo.clone()));
        (QuizService::new(fixed_clock(), progress.clone()), progress)
    }

    #[tokio::test]
    async fn six_of_seven_passes_and_completes_the_module() {
        let repo = InMemoryRepository::new();
        let (quiz, progress) = service(&repo);
        let key = ModuleKey::from_static("residential");

        let submission = quiz
            .submit(user(), &key, &questions(), &sheet(6), 400)
            .await
            .unwrap();
        assert_eq!(submission.outcome.score(), 86);
        assert_eq!(submission.route, QuizRoute::ReturnToTraining);
        assert_eq!(submission.attempts, 1);

        let stored = progress.get_progress(user(), &key).await;
        assert_eq!(stored.percent(), 100);
        assert_eq!(stored.status(), ModuleStatus::Complete);
        assert_eq!(stored.quiz_score(), Some(86));
        assert_eq!(stored.completed_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn four_of_seven_fails_back_to_fifty_percent() {
        let repo = InMemoryRepository::new();
        let (quiz, progress) = service(&repo);
        let key = ModuleKey::from_static("duct");

        let submission = quiz
            .submit(user(), &key, &questions(), &sheet(4), 250)
            .await
            .unwrap();
        assert_eq!(submission.outcome.score(), 57);
        assert!(!submission.outcome.passed());
        assert_eq!(submission.route, QuizRoute::ReviewModule);

        let stored = progress.get_progress(user(), &key).await;
        assert_eq!(stored.percent(), 50);
        assert_eq!(stored.status(), ModuleStatus::InProgress);
        assert_eq!(stored.completed_at(), None);
    }

    #[tokio::test]
    async fn attempts_accumulate_across_submissions() {
        let repo = InMemoryRepository::new();
        let (quiz, _) = service(&repo);
        let key = ModuleKey::from_static("flood");

        for expected in 1..=3 {
            let submission = quiz
                .submit(user(), &key, &questions(), &sheet(0), 100)
                .await
                .unwrap();
            assert_eq!(submission.attempts, expected);
        }
    }

    #[tokio::test]
    async fn failing_a_retake_keeps_the_completion_timestamp() {
        let repo = InMemoryRepository::new();
        let (quiz, progress) = service(&repo);
        let key = ModuleKey::from_static("safety");

        quiz.submit(user(), &key, &questions(), &sheet(7), 100)
            .await
            .unwrap();
        quiz.submit(user(), &key, &questions(), &sheet(2), 150)
            .await
            .unwrap();

        let stored = progress.get_progress(user(), &key).await;
        assert_eq!(stored.percent(), 50);
        assert_eq!(stored.status(), ModuleStatus::InProgress);
        // The earlier completion time survives the failed retake.
        assert_eq!(stored.completed_at(), Some(fixed_now()));
        assert_eq!(stored.attempts(), 2);
    }

    #[tokio::test]
    async fn unreachable_store_rejects_the_submission() {
        let repo = InMemoryRepository::new();
        repo.set_offline(true);
        let (quiz, _) = service(&repo);
        let err = quiz
            .submit(
                user(),
                &ModuleKey::from_static("equip"),
                &questions(),
                &sheet(7),
                50,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Progress(_)));
    }
}
