//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, QuizId, SessionError};
use storage::cache::CacheError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while sending a finished attempt to the grading backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("report request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("report rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by quiz sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizSourceError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),
    #[error("quiz file could not be read: {0}")]
    Io(String),
    #[error("quiz file could not be parsed: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] quiz_core::Error),
}

impl From<QuizError> for QuizSourceError {
    fn from(err: QuizError) -> Self {
        Self::Invalid(err.into())
    }
}

/// Errors emitted by the quiz controller and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("submission failed, try again: {0}")]
    Submission(#[from] SubmissionError),
    #[error("no finished attempt is waiting to be reported")]
    NoPendingReport,
    #[error("quiz view is no longer mounted")]
    Unmounted,
    #[error(transparent)]
    Source(#[from] QuizSourceError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
