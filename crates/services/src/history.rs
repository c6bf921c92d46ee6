use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{AttemptId, QuizId, QuizStatus};
use storage::repository::{AttemptRecord, AttemptRepository, StorageError};

/// Presentation-agnostic list item for a finished attempt.
///
/// No pre-formatted strings; the caller decides how to render times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptListItem {
    pub attempt_id: AttemptId,
    pub status: QuizStatus,
    pub score: u8,
    pub answered: u32,
    pub total: u32,
    pub finished_at: DateTime<Utc>,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_record(record: &AttemptRecord) -> Self {
        Self {
            attempt_id: record.attempt_id,
            status: record.status,
            score: record.score,
            answered: record.answered,
            total: record.total,
            finished_at: record.finished_at,
        }
    }
}

/// Read side over stored attempts.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Most recent attempts for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository query fails.
    pub async fn recent(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, StorageError> {
        let records = self.attempts.list_attempts(quiz_id, limit).await?;
        Ok(records.iter().map(AttemptListItem::from_record).collect())
    }

    /// Highest score recorded for a quiz, if any attempt exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository query fails.
    pub async fn best_score(&self, quiz_id: QuizId) -> Result<Option<u8>, StorageError> {
        let records = self.attempts.list_attempts(quiz_id, u32::MAX).await?;
        Ok(records.iter().map(|r| r.score).max())
    }
}
