use std::sync::Arc;

use quiz_core::model::QuizId;
use tracing::info;

use super::controller::{QuizController, QuizPorts};
use super::countdown::Ticks;
use super::source::QuizSource;
use crate::Clock;
use crate::error::ControllerError;
use crate::settings::QuizSettings;

/// Loads quizzes and hands out controllers wired to shared collaborators.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    source: Arc<dyn QuizSource>,
    ports: QuizPorts,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn QuizSource>, ports: QuizPorts) -> Self {
        Self {
            clock,
            settings: QuizSettings::default(),
            source,
            ports,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Fetch a quiz and start a session for it.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Source` if the quiz cannot be loaded.
    pub async fn start(&self, quiz_id: QuizId) -> Result<(QuizController, Ticks), ControllerError> {
        let quiz = self.source.fetch_quiz(quiz_id).await?;
        Ok(QuizController::load(quiz, self.ports.clone(), self.clock, &self.settings).await)
    }

    /// Drop any cached in-progress answers for a quiz.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Cache` if the cache backend fails.
    pub async fn clear_cached_answers(&self, quiz_id: QuizId) -> Result<(), ControllerError> {
        self.ports.cache.clear(quiz_id).await?;
        info!(%quiz_id, "cached answers cleared");
        Ok(())
    }
}
