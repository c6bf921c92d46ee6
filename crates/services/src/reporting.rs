use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quiz_core::model::{Answers, AttemptId, QuizId, QuizSession, QuizStatus};
use storage::repository::AttemptRecord;

use crate::error::SubmissionError;

/// What a finished attempt sends to the grading/reporting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizReport {
    pub quiz_id: QuizId,
    pub attempt_id: AttemptId,
    pub answers: Answers,
    pub score: u8,
    pub status: QuizStatus,
    pub cutoff_score: u8,
    pub answered: u32,
    pub total: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl QuizReport {
    /// Build a report from a terminal session. `None` while still in progress.
    #[must_use]
    pub fn from_session(session: &QuizSession, attempt_id: AttemptId) -> Option<Self> {
        if !session.status().is_terminal() {
            return None;
        }
        Some(Self {
            quiz_id: session.quiz_id(),
            attempt_id,
            answers: session.answers().clone(),
            score: session.score()?,
            status: session.status(),
            cutoff_score: session.quiz().cutoff_score(),
            answered: u32::try_from(session.answered_count()).unwrap_or(u32::MAX),
            total: u32::try_from(session.questions().len()).unwrap_or(u32::MAX),
            started_at: session.started_at(),
            finished_at: session.finished_at()?,
        })
    }

    #[must_use]
    pub fn to_record(&self) -> AttemptRecord {
        AttemptRecord {
            attempt_id: self.attempt_id,
            quiz_id: self.quiz_id,
            status: self.status,
            score: self.score,
            answers: self.answers.clone(),
            answered: self.answered,
            total: self.total,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Backend verdict for a reported attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeReceipt {
    pub passed: bool,
    #[serde(default)]
    pub next_module: Option<String>,
}

/// Port to the grading/reporting collaborator.
#[async_trait]
pub trait QuizReporter: Send + Sync {
    /// Send a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the backend cannot be reached or refuses
    /// the report. Callers may retry with the same report.
    async fn report(&self, report: &QuizReport) -> Result<GradeReceipt, SubmissionError>;
}

/// Grades against the quiz cutoff without any network round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalReporter;

#[async_trait]
impl QuizReporter for LocalReporter {
    async fn report(&self, report: &QuizReport) -> Result<GradeReceipt, SubmissionError> {
        debug!(quiz_id = %report.quiz_id, attempt_id = %report.attempt_id, "graded locally");
        Ok(GradeReceipt {
            passed: report.score >= report.cutoff_score,
            next_module: None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct HttpReporterConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

/// Posts reports as JSON to a configured endpoint.
#[derive(Clone)]
pub struct HttpReporter {
    client: Client,
    config: HttpReporterConfig,
}

impl HttpReporter {
    #[must_use]
    pub fn new(config: HttpReporterConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl QuizReporter for HttpReporter {
    async fn report(&self, report: &QuizReport) -> Result<GradeReceipt, SubmissionError> {
        let mut request = self.client.post(&self.config.endpoint).json(report);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected(body.trim().to_string()));
        }
        if !status.is_success() {
            return Err(SubmissionError::HttpStatus(status));
        }

        let receipt: GradeReceipt = response.json().await?;
        info!(
            quiz_id = %report.quiz_id,
            attempt_id = %report.attempt_id,
            passed = receipt.passed,
            "report accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId, Quiz};
    use quiz_core::time::fixed_now;

    fn finished_session() -> QuizSession {
        let q1 = Question::new(QuestionId::new(1), "Q1", vec!["A".into(), "B".into()], "A").unwrap();
        let q2 = Question::new(QuestionId::new(2), "Q2", vec!["A".into(), "B".into()], "B").unwrap();
        let quiz = Quiz::new(QuizId::new(5), "Report", vec![q1, q2], 60, 60).unwrap();
        let mut session = QuizSession::new(quiz, fixed_now());
        session.select_answer(QuestionId::new(1), "A").unwrap();
        session.select_answer(QuestionId::new(2), "A").unwrap();
        session.submit(fixed_now()).unwrap();
        session
    }

    #[test]
    fn report_requires_terminal_session() {
        let q = Question::new(QuestionId::new(1), "Q", vec!["A".into()], "A").unwrap();
        let quiz = Quiz::new(QuizId::new(1), "Open", vec![q], 50, 60).unwrap();
        let session = QuizSession::new(quiz, fixed_now());
        assert!(QuizReport::from_session(&session, AttemptId::new_v4()).is_none());
    }

    #[test]
    fn report_serializes_answers_by_question_id() {
        let attempt = AttemptId::new_v4();
        let report = QuizReport::from_session(&finished_session(), attempt).unwrap();
        assert_eq!(report.score, 50);
        assert_eq!(report.to_record().attempt_id, attempt);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["quiz_id"], 5);
        assert_eq!(json["status"], "submitted");
        assert_eq!(json["answers"]["2"], "A");
        assert_eq!(json["attempt_id"], attempt.to_string());
    }

    #[tokio::test]
    async fn local_reporter_applies_cutoff() {
        let report = QuizReport::from_session(&finished_session(), AttemptId::new_v4()).unwrap();
        let receipt = LocalReporter.report(&report).await.unwrap();
        assert!(!receipt.passed);
        assert_eq!(receipt.next_module, None);
    }

    #[test]
    fn receipt_tolerates_missing_next_module() {
        let receipt: GradeReceipt = serde_json::from_str(r#"{"passed":true}"#).unwrap();
        assert!(receipt.passed);
        assert!(receipt.next_module.is_none());
    }
}
