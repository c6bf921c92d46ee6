use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Quiz, QuizId};

use crate::error::QuizSourceError;

/// Loader port: where question sets come from.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch a quiz by id.
    ///
    /// # Errors
    ///
    /// Returns `QuizSourceError::NotFound` for unknown ids, or a load/parse error.
    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, QuizSourceError>;
}

/// Fixed set of quizzes held in memory.
#[derive(Clone, Default)]
pub struct InMemoryQuizSource {
    quizzes: Arc<HashMap<QuizId, Quiz>>,
}

impl InMemoryQuizSource {
    #[must_use]
    pub fn new(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        let quizzes = quizzes.into_iter().map(|q| (q.id(), q)).collect();
        Self {
            quizzes: Arc::new(quizzes),
        }
    }
}

#[async_trait]
impl QuizSource for InMemoryQuizSource {
    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, QuizSourceError> {
        self.quizzes
            .get(&id)
            .cloned()
            .ok_or(QuizSourceError::NotFound(id))
    }
}
