use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::history::AttemptHistoryService;
use crate::quiz::{QuizLoopService, QuizPorts, QuizSource};
use crate::reporting::QuizReporter;
use crate::settings::QuizSettings;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    history: Arc<AttemptHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        source: Arc<dyn QuizSource>,
        reporter: Arc<dyn QuizReporter>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings, source, reporter))
    }

    #[must_use]
    pub fn in_memory(
        clock: Clock,
        settings: QuizSettings,
        source: Arc<dyn QuizSource>,
        reporter: Arc<dyn QuizReporter>,
    ) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings, source, reporter)
    }

    fn from_storage(
        storage: &Storage,
        clock: Clock,
        settings: QuizSettings,
        source: Arc<dyn QuizSource>,
        reporter: Arc<dyn QuizReporter>,
    ) -> Self {
        let ports = QuizPorts {
            cache: Arc::new(storage.answer_cache()),
            attempts: Arc::clone(&storage.attempts),
            reporter,
        };
        let quiz_loop =
            Arc::new(QuizLoopService::new(clock, source, ports).with_settings(settings));
        let history = Arc::new(AttemptHistoryService::new(Arc::clone(&storage.attempts)));
        Self { quiz_loop, history }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }
}
