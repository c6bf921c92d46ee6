use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;
use crate::model::quiz::Quiz;
use crate::model::score::{correct_count, score_percent};

/// Selected option per question. Unanswered questions are absent.
pub type Answers = BTreeMap<QuestionId, String>;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    InProgress,
    Submitted,
    TimedOut,
}

impl QuizStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, QuizStatus::InProgress)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::InProgress => "in_progress",
            QuizStatus::Submitted => "submitted",
            QuizStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizStatus {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "timed_out" => Ok(Self::TimedOut),
            other => Err(SessionError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz session already finished ({status})")]
    Finished { status: QuizStatus },

    #[error("cannot submit yet: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),

    #[error("question {question} does not offer option {option:?}")]
    UnknownOption { question: QuestionId, option: String },

    #[error("unknown quiz status: {0}")]
    UnknownStatus(String),
}

//
// ─── TICK / PROGRESS ───────────────────────────────────────────────────────────
//

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session already left `in_progress`; nothing changed.
    Idle,
    Running { remaining_seconds: u32 },
    /// This tick exhausted the time limit and graded the session.
    TimedOut { score: u8 },
}

/// Snapshot of session progress for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub remaining_seconds: u32,
    pub status: QuizStatus,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory record of a single quiz attempt.
///
/// Holds the question set, the current position, answers, the countdown and
/// the final score. All transitions are synchronous and side-effect free;
/// caching and reporting happen in the services layer.
#[derive(Clone, PartialEq, Eq)]
pub struct QuizSession {
    quiz: Quiz,
    current_index: usize,
    answers: Answers,
    remaining_seconds: u32,
    status: QuizStatus,
    score: Option<u8>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a fresh session with no answers and the full time limit.
    #[must_use]
    pub fn new(quiz: Quiz, started_at: DateTime<Utc>) -> Self {
        let remaining_seconds = quiz.time_limit_secs();
        Self {
            quiz,
            current_index: 0,
            answers: Answers::new(),
            remaining_seconds,
            status: QuizStatus::InProgress,
            score: None,
            started_at,
            finished_at: None,
        }
    }

    /// Start a session seeded with previously cached answers.
    ///
    /// Entries for questions that are not in the quiz, or options the question
    /// does not offer, are dropped. Returns the session and the number of
    /// dropped entries.
    #[must_use]
    pub fn restored(quiz: Quiz, cached: Answers, started_at: DateTime<Utc>) -> (Self, usize) {
        let mut session = Self::new(quiz, started_at);
        let mut dropped = 0;
        for (question_id, option) in cached {
            let valid = session
                .quiz
                .question(question_id)
                .is_some_and(|q| q.offers(&option));
            if valid {
                session.answers.insert(question_id, option);
            } else {
                dropped += 1;
            }
        }
        (session, dropped)
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz.id()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.quiz.questions()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `Quiz` guarantees at least one question and the index is clamped.
        &self.quiz.questions()[self.current_index]
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> Option<&str> {
        self.answers.get(&question).map(String::as_str)
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> Option<u8> {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == QuizStatus::InProgress
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.is_active() && self.answers.len() == self.quiz.len()
    }

    /// Whether the final score reaches the quiz cutoff. `None` until graded.
    ///
    /// Informational only; nothing in the session depends on it.
    #[must_use]
    pub fn meets_cutoff(&self) -> Option<bool> {
        self.score.map(|s| s >= self.quiz.cutoff_score())
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            total: self.quiz.len(),
            answered: self.answered_count(),
            current_index: self.current_index,
            remaining_seconds: self.remaining_seconds,
            status: self.status,
        }
    }

    /// Record `option` as the answer to `question`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` once the session is terminal, and
    /// `UnknownQuestion` / `UnknownOption` for input outside the question set.
    pub fn select_answer(
        &mut self,
        question: QuestionId,
        option: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        let option = option.into();
        let q = self
            .quiz
            .question(question)
            .ok_or(SessionError::UnknownQuestion(question))?;
        if !q.offers(&option) {
            return Err(SessionError::UnknownOption { question, option });
        }
        self.answers.insert(question, option);
        Ok(())
    }

    /// Move to the next question. No-op on the last question or when finished.
    pub fn next(&mut self) -> usize {
        if self.is_active() && self.current_index + 1 < self.quiz.len() {
            self.current_index += 1;
        }
        self.current_index
    }

    /// Move to the previous question. No-op on the first question or when finished.
    pub fn previous(&mut self) -> usize {
        if self.is_active() {
            self.current_index = self.current_index.saturating_sub(1);
        }
        self.current_index
    }

    /// Jump to `index`, clamped to the question range.
    pub fn go_to(&mut self, index: usize) -> usize {
        if self.is_active() {
            self.current_index = index.min(self.quiz.len() - 1);
        }
        self.current_index
    }

    /// Clear every answer and return to the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` once the session is terminal.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.answers.clear();
        self.current_index = 0;
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// When the countdown reaches zero the session is graded with whatever
    /// answers exist and moves to `timed_out`. Later ticks return `Idle`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Idle;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            };
        }
        let score = self.grade();
        self.finish(QuizStatus::TimedOut, score, now);
        TickOutcome::TimedOut { score }
    }

    /// Grade a fully answered session and move to `submitted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` when already terminal and
    /// `SessionError::Incomplete` while any question is unanswered.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<u8, SessionError> {
        self.ensure_active()?;
        if !self.can_submit() {
            return Err(SessionError::Incomplete {
                answered: self.answered_count(),
                total: self.quiz.len(),
            });
        }
        let score = self.grade();
        self.finish(QuizStatus::Submitted, score, now);
        Ok(score)
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        correct_count(self.quiz.questions(), &self.answers)
    }

    fn grade(&self) -> u8 {
        score_percent(self.correct_count(), self.quiz.len())
    }

    fn finish(&mut self, status: QuizStatus, score: u8, now: DateTime<Utc>) {
        self.status = status;
        self.score = Some(score);
        self.finished_at = Some(now);
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::Finished {
                status: self.status,
            })
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id())
            .field("questions_len", &self.quiz.len())
            .field("current_index", &self.current_index)
            .field("answers_len", &self.answers.len())
            .field("remaining_seconds", &self.remaining_seconds)
            .field("status", &self.status)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
