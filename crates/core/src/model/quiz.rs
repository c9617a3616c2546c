use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::rollup::ratio_percent;

/// Minimum score required to pass a module quiz.
pub const PASS_MARK: u8 = 80;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("correct option index {correct} is out of range for {options} options")]
    CorrectOutOfRange { correct: u16, options: usize },
}

/// One multiple-choice question, compiled into the client.
///
/// Immutable at runtime; the option order is the presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    prompt: String,
    options: Vec<String>,
    correct: u16,
}

impl QuizQuestion {
    /// Builds a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an empty prompt, fewer than two options, or a
    /// correct index outside the option list.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: u16,
    ) -> Result<Self, QuizError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions(options.len()));
        }
        if usize::from(correct) >= options.len() {
            return Err(QuizError::CorrectOutOfRange {
                correct,
                options: options.len(),
            });
        }
        Ok(Self {
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> u16 {
        self.correct
    }
}

/// The user's selected option per question index.
///
/// Partial sheets are legal at submit time; unanswered questions count as
/// incorrect. A retake starts from an empty sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet(BTreeMap<u16, u16>);

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the selection for a question.
    pub fn select(&mut self, question: u16, option: u16) {
        self.0.insert(question, option);
    }

    #[must_use]
    pub fn selected(&self, question: u16) -> Option<u16> {
        self.0.get(&question).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wipes every selection, used when a quiz is retaken.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.0.iter().map(|(&q, &o)| (q, o))
    }
}

impl FromIterator<(u16, u16)> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = (u16, u16)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    score: u8,
    correct: u16,
    total: u16,
}

impl QuizOutcome {
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn correct(&self) -> u16 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u16 {
        self.total
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= PASS_MARK
    }
}

/// Grades a submission: `score = round(100 * correct / total)`, half-up.
#[must_use]
pub fn grade(questions: &[QuizQuestion], answers: &AnswerSheet) -> QuizOutcome {
    let total = questions.len() as u16;
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.selected(*i as u16) == Some(q.correct_index()))
        .count() as u16;

    QuizOutcome {
        score: ratio_percent(u32::from(correct), u32::from(total)),
        correct,
        total,
    }
}

/// Post-submission color of one option row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Correct,
    Incorrect,
}

/// Reveal rule after a submission.
///
/// On a failing attempt only the user's own selections are colored; the
/// correct answer stays neutral unless they picked it. On a passing attempt
/// the correct option is always green and any wrong pick is red.
#[must_use]
pub fn mark_option(passed: bool, selected: Option<u16>, correct: u16, option: u16) -> OptionMark {
    let picked = selected == Some(option);
    if passed {
        if option == correct {
            OptionMark::Correct
        } else if picked {
            OptionMark::Incorrect
        } else {
            OptionMark::Neutral
        }
    } else if picked && option == correct {
        OptionMark::Correct
    } else if picked {
        OptionMark::Incorrect
    } else {
        OptionMark::Neutral
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: u16) -> QuizQuestion {
        QuizQuestion::new(
            "Q",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
        )
        .unwrap()
    }

    fn seven_questions() -> Vec<QuizQuestion> {
        (0..7).map(|i| question(i % 4)).collect()
    }

    #[test]
    fn validates_question_shape() {
        assert_eq!(
            QuizQuestion::new("  ", vec!["a".into(), "b".into()], 0),
            Err(QuizError::EmptyPrompt)
        );
        assert_eq!(
            QuizQuestion::new("Q", vec!["a".into()], 0),
            Err(QuizError::TooFewOptions(1))
        );
        assert_eq!(
            QuizQuestion::new("Q", vec!["a".into(), "b".into()], 2),
            Err(QuizError::CorrectOutOfRange {
                correct: 2,
                options: 2
            })
        );
    }

    #[test]
    fn six_of_seven_passes() {
        let questions = seven_questions();
        let mut sheet = AnswerSheet::new();
        for (i, q) in questions.iter().enumerate() {
            sheet.select(i as u16, q.correct_index());
        }
        // Spoil one answer.
        sheet.select(0, questions[0].correct_index() + 1);

        let outcome = grade(&questions, &sheet);
        assert_eq!(outcome.score(), 86);
        assert_eq!(outcome.correct(), 6);
        assert!(outcome.passed());
    }

    #[test]
    fn four_of_seven_fails() {
        let questions = seven_questions();
        let mut sheet = AnswerSheet::new();
        for (i, q) in questions.iter().enumerate().take(4) {
            sheet.select(i as u16, q.correct_index());
        }

        let outcome = grade(&questions, &sheet);
        assert_eq!(outcome.score(), 57);
        assert!(!outcome.passed());
    }

    #[test]
    fn unanswered_counts_as_incorrect() {
        let questions = seven_questions();
        let outcome = grade(&questions, &AnswerSheet::new());
        assert_eq!(outcome.score(), 0);
        assert_eq!(outcome.correct(), 0);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let outcome = grade(&[], &AnswerSheet::new());
        assert_eq!(outcome.score(), 0);
        assert!(!outcome.passed());
    }

    #[test]
    fn exact_pass_mark_passes() {
        // 4 of 5 correct = 80.
        let questions: Vec<_> = (0..5).map(|_| question(1)).collect();
        let mut sheet = AnswerSheet::new();
        for i in 0..4u16 {
            sheet.select(i, 1);
        }
        let outcome = grade(&questions, &sheet);
        assert_eq!(outcome.score(), 80);
        assert!(outcome.passed());
    }

    #[test]
    fn failing_reveal_hides_unpicked_correct_answer() {
        // User picked option 2, correct is 0, attempt failed.
        let selected = Some(2);
        assert_eq!(mark_option(false, selected, 0, 0), OptionMark::Neutral);
        assert_eq!(mark_option(false, selected, 0, 2), OptionMark::Incorrect);
        assert_eq!(mark_option(false, selected, 0, 1), OptionMark::Neutral);
        // Their own correct picks still show green.
        assert_eq!(mark_option(false, Some(0), 0, 0), OptionMark::Correct);
    }

    #[test]
    fn passing_reveal_always_shows_correct_answer() {
        let selected = Some(2);
        assert_eq!(mark_option(true, selected, 0, 0), OptionMark::Correct);
        assert_eq!(mark_option(true, selected, 0, 2), OptionMark::Incorrect);
        assert_eq!(mark_option(true, selected, 0, 1), OptionMark::Neutral);
        assert_eq!(mark_option(true, None, 0, 0), OptionMark::Correct);
    }

    #[test]
    fn retake_clears_sheet() {
        let mut sheet = AnswerSheet::new();
        sheet.select(0, 1);
        sheet.select(1, 2);
        assert_eq!(sheet.answered_count(), 2);
        sheet.clear();
        assert!(sheet.is_empty());
    }
}
