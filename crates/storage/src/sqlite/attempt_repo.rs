use async_trait::async_trait;
use quiz_core::model::{AttemptId, QuizId};

use super::SqliteRepository;
use super::mapping::{map_attempt_row, quiz_id_to_i64, ser};
use crate::cache::encode_answers;
use crate::repository::{AttemptRecord, AttemptRepository, StorageError};

const SELECT_ATTEMPT: &str = r"
    SELECT
        attempt_id, quiz_id, status, score, answers,
        answered, total, started_at, finished_at
    FROM quiz_attempts
";

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, record: &AttemptRecord) -> Result<(), StorageError> {
        let answers = encode_answers(&record.answers).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    attempt_id, quiz_id, status, score, answers,
                    answered, total, started_at, finished_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(attempt_id) DO NOTHING
            ",
        )
        .bind(record.attempt_id.to_string())
        .bind(quiz_id_to_i64(record.quiz_id)?)
        .bind(record.status.as_str())
        .bind(i64::from(record.score))
        .bind(answers)
        .bind(i64::from(record.answered))
        .bind(i64::from(record.total))
        .bind(record.started_at)
        .bind(record.finished_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let sql = format!("{SELECT_ATTEMPT} WHERE attempt_id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn list_attempts(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let sql = format!(
            "{SELECT_ATTEMPT} WHERE quiz_id = ?1 ORDER BY finished_at DESC, rowid DESC LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(quiz_id_to_i64(quiz_id)?)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_attempt_row).collect()
    }
}
