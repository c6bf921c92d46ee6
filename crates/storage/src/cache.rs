//! Local answer cache: the quiz key scheme and JSON codec over a key/value store.
//!
//! Two keys per quiz, matching what the web client writes to local storage:
//! `quiz_<id>_answers` holds a JSON object of question id to option, and
//! `quiz_<id>_timestamp` holds the epoch seconds of the last write.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Answers, QuestionId, QuizId};
use thiserror::Error;

use crate::repository::{KeyValueStore, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// Stored data exists but cannot be decoded. Callers treat this as a miss.
    #[error("cached answers could not be parsed: {0}")]
    Parse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Answers as last written to the cache, with the write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAnswers {
    pub answers: Answers,
    /// Epoch seconds.
    pub written_at: i64,
}

#[must_use]
pub fn answers_key(quiz: QuizId) -> String {
    format!("quiz_{quiz}_answers")
}

#[must_use]
pub fn timestamp_key(quiz: QuizId) -> String {
    format!("quiz_{quiz}_timestamp")
}

/// Encode answers as a JSON object keyed by question id.
///
/// # Errors
///
/// Returns `serde_json::Error` if encoding fails.
pub fn encode_answers(answers: &Answers) -> Result<String, serde_json::Error> {
    let raw: BTreeMap<u64, &str> = answers
        .iter()
        .map(|(id, option)| (id.value(), option.as_str()))
        .collect();
    serde_json::to_string(&raw)
}

/// Decode a JSON answers object.
///
/// # Errors
///
/// Returns `serde_json::Error` for malformed JSON or non-numeric keys.
pub fn decode_answers(raw: &str) -> Result<Answers, serde_json::Error> {
    let parsed: BTreeMap<u64, String> = serde_json::from_str(raw)?;
    Ok(parsed
        .into_iter()
        .map(|(id, option)| (QuestionId::new(id), option))
        .collect())
}

/// Port for persisting in-progress answers between reloads.
#[async_trait]
pub trait AnswerCache: Send + Sync {
    /// Load cached answers for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Parse` for corrupt entries and `CacheError::Storage`
    /// when the backend fails.
    async fn load(&self, quiz: QuizId) -> Result<Option<CachedAnswers>, CacheError>;

    /// Write answers and their timestamp.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or the backend write fails.
    async fn save(&self, quiz: QuizId, cached: &CachedAnswers) -> Result<(), CacheError>;

    /// Remove both keys for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Storage` if the backend write fails.
    async fn clear(&self, quiz: QuizId) -> Result<(), CacheError>;
}

/// `AnswerCache` backed by any `KeyValueStore`.
#[derive(Clone)]
pub struct LocalAnswerCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocalAnswerCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnswerCache for LocalAnswerCache {
    async fn load(&self, quiz: QuizId) -> Result<Option<CachedAnswers>, CacheError> {
        let answers = self.store.get(&answers_key(quiz)).await?;
        let stamp = self.store.get(&timestamp_key(quiz)).await?;

        let (answers, stamp) = match (answers, stamp) {
            (None, None) => return Ok(None),
            (Some(answers), Some(stamp)) => (answers, stamp),
            (Some(_), None) => return Err(CacheError::Parse("missing timestamp".into())),
            (None, Some(_)) => return Err(CacheError::Parse("missing answers".into())),
        };

        let written_at = stamp
            .trim()
            .parse::<i64>()
            .map_err(|e| CacheError::Parse(format!("timestamp {stamp:?}: {e}")))?;
        let answers = decode_answers(&answers).map_err(|e| CacheError::Parse(e.to_string()))?;

        Ok(Some(CachedAnswers {
            answers,
            written_at,
        }))
    }

    async fn save(&self, quiz: QuizId, cached: &CachedAnswers) -> Result<(), CacheError> {
        let encoded =
            encode_answers(&cached.answers).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(&answers_key(quiz), &encoded).await?;
        self.store
            .set(&timestamp_key(quiz), &cached.written_at.to_string())
            .await?;
        Ok(())
    }

    async fn clear(&self, quiz: QuizId) -> Result<(), CacheError> {
        self.store.remove(&answers_key(quiz)).await?;
        self.store.remove(&timestamp_key(quiz)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    fn cache() -> (InMemoryRepository, LocalAnswerCache) {
        let repo = InMemoryRepository::new();
        let cache = LocalAnswerCache::new(Arc::new(repo.clone()));
        (repo, cache)
    }

    #[test]
    fn keys_follow_local_storage_scheme() {
        assert_eq!(answers_key(QuizId::new(12)), "quiz_12_answers");
        assert_eq!(timestamp_key(QuizId::new(12)), "quiz_12_timestamp");
    }

    #[test]
    fn answers_encode_as_object_keyed_by_id() {
        let mut answers = Answers::new();
        answers.insert(QuestionId::new(2), "B".into());
        answers.insert(QuestionId::new(1), "A".into());
        let json = encode_answers(&answers).unwrap();
        assert_eq!(json, r#"{"1":"A","2":"B"}"#);
        assert_eq!(decode_answers(&json).unwrap(), answers);
    }

    #[tokio::test]
    async fn save_load_clear() {
        let (repo, cache) = cache();
        let quiz = QuizId::new(3);
        let mut answers = Answers::new();
        answers.insert(QuestionId::new(1), "A".into());
        let cached = CachedAnswers {
            answers,
            written_at: 1_700_000_000,
        };

        cache.save(quiz, &cached).await.unwrap();
        assert_eq!(
            repo.get("quiz_3_timestamp").await.unwrap().as_deref(),
            Some("1700000000")
        );
        assert_eq!(cache.load(quiz).await.unwrap(), Some(cached));

        cache.clear(quiz).await.unwrap();
        assert_eq!(cache.load(quiz).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_entries_are_parse_errors() {
        let (repo, cache) = cache();
        let quiz = QuizId::new(4);

        repo.set("quiz_4_answers", "{not json").await.unwrap();
        repo.set("quiz_4_timestamp", "1").await.unwrap();
        assert!(matches!(cache.load(quiz).await, Err(CacheError::Parse(_))));

        repo.set("quiz_4_answers", "{}").await.unwrap();
        repo.set("quiz_4_timestamp", "yesterday").await.unwrap();
        assert!(matches!(cache.load(quiz).await, Err(CacheError::Parse(_))));

        repo.remove("quiz_4_timestamp").await.unwrap();
        assert!(matches!(cache.load(quiz).await, Err(CacheError::Parse(_))));
    }
}
