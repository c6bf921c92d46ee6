use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::{Question, QuestionError};

/// Time limit applied when the backend does not send one.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 1800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {id} has no questions")]
    NoQuestions { id: QuizId },

    #[error("quiz {quiz} contains question {question} more than once")]
    DuplicateQuestion { quiz: QuizId, question: QuestionId },

    #[error("cutoff score must be between 0 and 100, got {0}")]
    InvalidCutoff(u8),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// A loaded quiz: question set, pass mark and time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    questions: Vec<Question>,
    cutoff_score: u8,
    time_limit_secs: u32,
}

impl Quiz {
    /// Build a quiz from an already validated question set.
    ///
    /// A zero `time_limit_secs` means the backend sent none and becomes
    /// [`DEFAULT_TIME_LIMIT_SECS`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty set,
    /// `QuizError::DuplicateQuestion` when ids repeat, and
    /// `QuizError::InvalidCutoff` when the cutoff exceeds 100.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        questions: Vec<Question>,
        cutoff_score: u8,
        time_limit_secs: u32,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions { id });
        }
        if cutoff_score > 100 {
            return Err(QuizError::InvalidCutoff(cutoff_score));
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion {
                    quiz: id,
                    question: question.id(),
                });
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            questions,
            cutoff_score,
            time_limit_secs: if time_limit_secs == 0 {
                DEFAULT_TIME_LIMIT_SECS
            } else {
                time_limit_secs
            },
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed quiz; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn cutoff_score(&self) -> u8 {
        self.cutoff_score
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }
}
