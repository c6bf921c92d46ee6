use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question as supplied by the backend.
///
/// Immutable once a session starts. Options are compared by exact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} lists option {option:?} more than once")]
    DuplicateOption { id: QuestionId, option: String },

    #[error("question {id} marks {correct:?} as correct but does not offer it")]
    CorrectOptionMissing { id: QuestionId, correct: String },
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, there are no options,
    /// an option repeats, or the correct option is not among the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_owned();
        let correct_option = correct_option.into();

        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption {
                    id,
                    option: option.clone(),
                });
            }
        }

        if !seen.contains(correct_option.as_str()) {
            return Err(QuestionError::CorrectOptionMissing {
                id,
                correct: correct_option,
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
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
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Strict equality against the correct option.
    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn valid_question_trims_prompt() {
        let q = Question::new(QuestionId::new(1), "  2 + 2?  ", opts(&["3", "4"]), "4").unwrap();
        assert_eq!(q.prompt(), "2 + 2?");
        assert!(q.offers("3"));
        assert!(q.is_correct("4"));
        assert!(!q.is_correct(" 4"));
    }

    #[test]
    fn rejects_missing_correct_option() {
        let err = Question::new(QuestionId::new(7), "Pick", opts(&["A", "B"]), "C").unwrap_err();
        assert!(matches!(err, QuestionError::CorrectOptionMissing { .. }));
    }

    #[test]
    fn rejects_duplicate_options_and_blank_prompt() {
        let dup = Question::new(QuestionId::new(1), "Pick", opts(&["A", "A"]), "A").unwrap_err();
        assert!(matches!(dup, QuestionError::DuplicateOption { .. }));

        let blank = Question::new(QuestionId::new(1), "   ", opts(&["A"]), "A").unwrap_err();
        assert_eq!(blank, QuestionError::EmptyPrompt { id: QuestionId::new(1) });

        let none = Question::new(QuestionId::new(2), "Pick", Vec::new(), "A").unwrap_err();
        assert_eq!(none, QuestionError::NoOptions { id: QuestionId::new(2) });
    }
}
