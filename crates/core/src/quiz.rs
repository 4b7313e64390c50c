use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

/// Quiz runs at or above this percentage count toward the Quiz Master badge.
pub const HIGH_SCORE_PERCENT: u8 = 90;

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;

/// A multiple-choice question authored in the quiz maker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    #[serde(default)]
    pub correct: usize,
}

impl QuizQuestion {
    /// Build a question from authored options, dropping blank ones. The
    /// first surviving option is the correct answer, matching how the quiz
    /// maker labels its inputs.
    pub fn new(prompt: impl Into<String>, options: impl IntoIterator<Item = String>) -> Self {
        let options: Vec<String> = options
            .into_iter()
            .filter(|o| !o.trim().is_empty())
            .take(MAX_OPTIONS)
            .collect();
        Self {
            prompt: prompt.into(),
            options,
            correct: 0,
        }
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct
    }
}

impl Document for QuizQuestion {
    const KIND: &'static str = "quiz_questions";

    /// Authoring order.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        creation_order(a, b)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("prompt", &self.prompt)?;
        if self.options.len() < MIN_OPTIONS {
            return Err(ValidationError::TooFewOptions {
                min: MIN_OPTIONS,
                got: self.options.len(),
            });
        }
        if self.correct >= self.options.len() {
            return Err(ValidationError::CorrectOutOfBounds {
                index: self.correct,
                len: self.options.len(),
            });
        }
        Ok(())
    }
}

/// Result of answering a sequence of questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

/// A persisted quiz attempt, under `users/{uid}/quiz_runs`. The attempt
/// time is the record's `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRun {
    pub correct: usize,
    pub total: usize,
}

impl QuizRun {
    pub fn score(&self) -> QuizScore {
        QuizScore {
            correct: self.correct,
            total: self.total,
        }
    }
}

impl From<QuizScore> for QuizRun {
    fn from(score: QuizScore) -> Self {
        Self {
            correct: score.correct,
            total: score.total,
        }
    }
}

impl Document for QuizRun {
    const KIND: &'static str = "quiz_runs";

    /// Newest attempt first.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        creation_order(b, a)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.correct > self.total {
            return Err(ValidationError::OutOfRange {
                field: "correct",
                value: self.correct as u32,
                max: self.total as u32,
            });
        }
        Ok(())
    }
}

impl QuizScore {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct * 100) / self.total) as u8
    }

    pub fn is_high_score(&self) -> bool {
        self.total > 0 && self.percent() >= HIGH_SCORE_PERCENT
    }
}

/// Score answers against questions, pairwise. Extra answers are ignored;
/// unanswered questions count as wrong.
pub fn score(questions: &[Stored<QuizQuestion>], answers: &[usize]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, answer)| q.data.is_correct(**answer))
        .count();
    QuizScore {
        correct,
        total: questions.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn question(prompt: &str) -> QuizQuestion {
        QuizQuestion::new(
            prompt,
            ["right", "wrong", "also wrong", ""].map(String::from),
        )
    }

    #[test]
    fn blank_options_are_dropped() {
        let q = question("2+2?");
        assert_eq!(q.options.len(), 3);
        assert!(q.is_correct(0));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn needs_two_options() {
        let q = QuizQuestion::new("q", ["only one".to_string()]);
        assert_eq!(
            q.validate(),
            Err(ValidationError::TooFewOptions { min: 2, got: 1 })
        );
    }

    #[test]
    fn correct_index_must_be_in_bounds() {
        let mut q = question("q");
        q.correct = 3;
        assert!(matches!(
            q.validate(),
            Err(ValidationError::CorrectOutOfBounds { .. })
        ));
    }

    #[test]
    fn scoring_counts_unanswered_as_wrong() {
        let questions = vec![
            testing::stored_at("q1", 0, question("a")),
            testing::stored_at("q2", 1, question("b")),
            testing::stored_at("q3", 2, question("c")),
        ];
        let s = score(&questions, &[0, 1]);
        assert_eq!(s.correct, 1);
        assert_eq!(s.total, 3);
        assert_eq!(s.percent(), 33);
        assert!(!s.is_high_score());
    }

    #[test]
    fn runs_validate_and_order_newest_first() {
        let bad = QuizRun {
            correct: 3,
            total: 2,
        };
        assert!(bad.validate().is_err());

        let runs = vec![
            testing::stored_at("old", 0, QuizRun { correct: 1, total: 2 }),
            testing::stored_at("new", 1, QuizRun { correct: 2, total: 2 }),
        ];
        let mut sorted = runs.clone();
        sorted.sort_by(QuizRun::order);
        assert_eq!(sorted[0].id, "new");
    }

    #[test]
    fn high_score_boundary() {
        let questions: Vec<_> = (0..10)
            .map(|i| testing::stored_at(&format!("q{i}"), i, question("q")))
            .collect();
        let all_right = vec![0; 10];
        assert!(score(&questions, &all_right).is_high_score());
        let nine_right: Vec<usize> = (0..10).map(|i| if i == 0 { 1 } else { 0 }).collect();
        assert!(score(&questions, &nine_right).is_high_score());
        let empty = score(&[], &[]);
        assert!(!empty.is_high_score());
    }
}
