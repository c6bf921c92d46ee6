//! Quiz definitions stored as TOML.
//!
//! ```toml
//! id = 3
//! title = "Capitals"
//! cutoff_score = 60
//! time_limit_secs = 300
//!
//! [[questions]]
//! id = 1
//! question = "Capital of France?"
//! options = ["Paris", "Lyon"]
//! correct_option = "Paris"
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use quiz_core::model::{DEFAULT_TIME_LIMIT_SECS, Question, QuestionId, Quiz, QuizId};
use services::{QuizSource, QuizSourceError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuizFile {
    id: u64,
    title: String,
    #[serde(default)]
    cutoff_score: u8,
    #[serde(default = "default_time_limit")]
    time_limit_secs: u32,
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionEntry {
    id: u64,
    question: String,
    options: Vec<String>,
    correct_option: String,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

/// Parse and validate a quiz definition.
///
/// # Errors
///
/// Returns `QuizSourceError::Parse` for malformed TOML and
/// `QuizSourceError::Invalid` when the content fails validation.
pub fn parse_quiz(raw: &str) -> Result<Quiz, QuizSourceError> {
    let file: QuizFile = toml::from_str(raw).map_err(|e| QuizSourceError::Parse(e.to_string()))?;

    let questions = file
        .questions
        .into_iter()
        .map(|q| Question::new(QuestionId::new(q.id), q.question, q.options, q.correct_option))
        .collect::<Result<Vec<_>, _>>()
        .map_err(quiz_core::Error::from)?;

    Ok(Quiz::new(
        QuizId::new(file.id),
        file.title,
        questions,
        file.cutoff_score,
        file.time_limit_secs,
    )?)
}

/// Read a quiz definition from disk.
///
/// # Errors
///
/// Returns `QuizSourceError::Io` if the file cannot be read, otherwise the
/// errors of [`parse_quiz`].
pub async fn read_quiz(path: &Path) -> Result<Quiz, QuizSourceError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QuizSourceError::Io(format!("{}: {e}", path.display())))?;
    parse_quiz(&raw)
}

/// `QuizSource` over a single TOML file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct TomlQuizSource {
    path: PathBuf,
}

impl TomlQuizSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuizSource for TomlQuizSource {
    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, QuizSourceError> {
        let quiz = read_quiz(&self.path).await?;
        if quiz.id() != id {
            return Err(QuizSourceError::NotFound(id));
        }
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionError, QuizError};

    const CAPITALS: &str = r#"
id = 3
title = "Capitals"
cutoff_score = 60
time_limit_secs = 90

[[questions]]
id = 1
question = "Capital of France?"
options = ["Paris", "Lyon"]
correct_option = "Paris"

[[questions]]
id = 2
question = "Capital of Italy?"
options = ["Milan", "Rome"]
correct_option = "Rome"
"#;

    #[test]
    fn parses_quiz_file() {
        let quiz = parse_quiz(CAPITALS).unwrap();
        assert_eq!(quiz.id(), QuizId::new(3));
        assert_eq!(quiz.title(), "Capitals");
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.cutoff_score(), 60);
        assert_eq!(quiz.time_limit_secs(), 90);
        assert_eq!(quiz.questions()[1].correct_option(), "Rome");
    }

    #[test]
    fn time_limit_defaults_when_omitted() {
        let raw = CAPITALS.replace("time_limit_secs = 90\n", "");
        let quiz = parse_quiz(&raw).unwrap();
        assert_eq!(quiz.time_limit_secs(), DEFAULT_TIME_LIMIT_SECS);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_quiz("id = \"three\"").unwrap_err();
        assert!(matches!(err, QuizSourceError::Parse(_)));
    }

    #[test]
    fn invalid_question_is_rejected() {
        let raw = CAPITALS.replace(r#"correct_option = "Rome""#, r#"correct_option = "Turin""#);
        let err = parse_quiz(&raw).unwrap_err();
        assert!(matches!(
            err,
            QuizSourceError::Invalid(quiz_core::Error::Question(
                QuestionError::CorrectOptionMissing { .. }
            ))
        ));
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let raw = "id = 9\ntitle = \"Empty\"\nquestions = []\n";
        let err = parse_quiz(raw).unwrap_err();
        assert!(matches!(
            err,
            QuizSourceError::Invalid(quiz_core::Error::Quiz(QuizError::NoQuestions { .. }))
        ));
    }

    #[tokio::test]
    async fn source_checks_the_requested_id() {
        let path = std::env::temp_dir().join(format!("quiz-file-{}.toml", std::process::id()));
        tokio::fs::write(&path, CAPITALS).await.unwrap();
        let source = TomlQuizSource::new(&path);

        assert_eq!(source.fetch_quiz(QuizId::new(3)).await.unwrap().len(), 2);
        let err = source.fetch_quiz(QuizId::new(4)).await.unwrap_err();
        assert!(matches!(err, QuizSourceError::NotFound(_)));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = read_quiz(Path::new("/nonexistent/quiz.toml")).await.unwrap_err();
        assert!(matches!(err, QuizSourceError::Io(_)));
    }
}
