use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use quiz_core::Clock;
use quiz_core::model::{
    Answers, AttemptId, QuestionId, Quiz, QuizId, QuizProgress, QuizSession, TickOutcome,
};
use quiz_core::time::is_within_window;
use storage::cache::{AnswerCache, CacheError, CachedAnswers};
use storage::repository::{AttemptRepository, StorageError};
use tracing::{debug, info, warn};

use super::countdown::{self, CountdownHandle, Ticks};
use crate::error::{ControllerError, SubmissionError};
use crate::reporting::{GradeReceipt, QuizReport, QuizReporter};
use crate::settings::QuizSettings;

//
// ─── PORTS ─────────────────────────────────────────────────────────────────────
//

/// Collaborators injected into every controller.
#[derive(Clone)]
pub struct QuizPorts {
    pub cache: Arc<dyn AnswerCache>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub reporter: Arc<dyn QuizReporter>,
}

//
// ─── DELIVERY ──────────────────────────────────────────────────────────────────
//

/// Result of sending a report, tagged with the attempt it belongs to.
#[derive(Debug)]
pub struct Delivery {
    pub attempt_id: AttemptId,
    pub result: Result<GradeReceipt, SubmissionError>,
}

/// A report ready to send. Owns everything it needs, so it can run on another
/// task while the controller keeps handling events.
pub struct ReportTask {
    reporter: Arc<dyn QuizReporter>,
    report: QuizReport,
}

impl ReportTask {
    #[must_use]
    pub fn report(&self) -> &QuizReport {
        &self.report
    }

    pub async fn run(self) -> Delivery {
        let result = self.reporter.report(&self.report).await;
        Delivery {
            attempt_id: self.report.attempt_id,
            result,
        }
    }
}

/// What `accept_delivery` did with a delivery.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Applied(GradeReceipt),
    /// The report stays pending and can be retried.
    Failed(SubmissionError),
    /// The view was unmounted or the delivery belongs to another attempt.
    Discarded,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owns one quiz session plus its countdown, cache write-through and
/// submission bookkeeping.
///
/// All transitions take `&mut self`, so events are applied one at a time.
pub struct QuizController {
    session: QuizSession,
    attempt_id: AttemptId,
    clock: Clock,
    ports: QuizPorts,
    countdown: Option<CountdownHandle>,
    mounted: bool,
    restored: bool,
    pending: Option<QuizReport>,
    receipt: Option<GradeReceipt>,
    submission_error: Option<String>,
}

impl QuizController {
    /// Create a controller for `quiz`, restoring cached answers when they are
    /// still inside the resume window, and start its countdown.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn load(
        quiz: Quiz,
        ports: QuizPorts,
        clock: Clock,
        settings: &QuizSettings,
    ) -> (Self, Ticks) {
        let quiz_id = quiz.id();
        let window = settings.cache_window_for(&quiz);
        let now = clock.now();

        let cached = restore_answers(ports.cache.as_ref(), quiz_id, now.timestamp(), window).await;
        let session = match cached {
            Some(answers) => {
                let (session, dropped) = QuizSession::restored(quiz, answers, now);
                if dropped > 0 {
                    debug!(%quiz_id, dropped, "ignored cached answers outside the question set");
                }
                session
            }
            None => QuizSession::new(quiz, now),
        };
        let restored = session.answered_count() > 0;

        let (handle, ticks) = countdown::start(settings.tick_period());
        let attempt_id = AttemptId::new_v4();
        info!(
            %quiz_id,
            %attempt_id,
            restored,
            answered = session.answered_count(),
            remaining_seconds = session.remaining_seconds(),
            "quiz session started"
        );

        let controller = Self {
            session,
            attempt_id,
            clock,
            ports,
            countdown: Some(handle),
            mounted: true,
            restored,
            pending: None,
            receipt: None,
            submission_error: None,
        };
        (controller, ticks)
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.session.quiz_id()
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.session.can_submit()
    }

    /// True when answers were resumed from the local cache.
    #[must_use]
    pub fn was_restored(&self) -> bool {
        self.restored
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[must_use]
    pub fn is_counting_down(&self) -> bool {
        self.countdown.as_ref().is_some_and(|h| !h.is_cancelled())
    }

    /// Report waiting to be delivered (or re-delivered after a failure).
    #[must_use]
    pub fn pending_report(&self) -> Option<&QuizReport> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn receipt(&self) -> Option<&GradeReceipt> {
        self.receipt.as_ref()
    }

    /// Last delivery failure, for a retry banner.
    #[must_use]
    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    /// Record an answer and write the answers through to the local cache.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Session` when the session is finished or the
    /// question/option is unknown. Cache failures are logged, not returned.
    pub async fn select_answer(
        &mut self,
        question: QuestionId,
        option: impl Into<String>,
    ) -> Result<(), ControllerError> {
        self.session.select_answer(question, option)?;
        self.write_through().await;
        Ok(())
    }

    pub fn next(&mut self) -> usize {
        self.session.next()
    }

    pub fn previous(&mut self) -> usize {
        self.session.previous()
    }

    pub fn go_to(&mut self, index: usize) -> usize {
        self.session.go_to(index)
    }

    /// Clear answers and the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Session` when the session is finished.
    pub async fn reset(&mut self) -> Result<(), ControllerError> {
        self.session.reset()?;
        self.clear_cache().await;
        info!(quiz_id = %self.quiz_id(), "answers reset");
        Ok(())
    }

    /// Apply one countdown tick. Reaching zero grades and finalizes the attempt.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = self.session.tick(self.clock.now());
        if let TickOutcome::TimedOut { score } = outcome {
            info!(
                quiz_id = %self.quiz_id(),
                score,
                answered = self.session.answered_count(),
                "time limit reached"
            );
            self.finalize().await;
        }
        outcome
    }

    /// Grade a complete attempt and finalize it.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Session` with `SessionError::Incomplete`
    /// while questions are unanswered, or `Finished` when already terminal.
    pub async fn submit(&mut self) -> Result<u8, ControllerError> {
        let score = self.session.submit(self.clock.now())?;
        info!(quiz_id = %self.quiz_id(), score, "quiz submitted");
        self.finalize().await;
        Ok(score)
    }

    /// Detach from the view: stop the countdown and ignore late deliveries.
    pub fn unmount(&mut self) {
        self.stop_countdown();
        if self.mounted {
            debug!(quiz_id = %self.quiz_id(), "quiz view unmounted");
        }
        self.mounted = false;
    }

    /// Report sending work for the pending attempt, if any.
    #[must_use]
    pub fn report_task(&self) -> Option<ReportTask> {
        self.pending.as_ref().map(|report| ReportTask {
            reporter: Arc::clone(&self.ports.reporter),
            report: report.clone(),
        })
    }

    /// Apply a delivery if this controller is still mounted and waiting for it.
    pub fn accept_delivery(&mut self, delivery: Delivery) -> DeliveryOutcome {
        let waiting_for = self.pending.as_ref().map(|r| r.attempt_id);
        if !self.mounted || waiting_for != Some(delivery.attempt_id) {
            debug!(attempt_id = %delivery.attempt_id, "discarding delivery for inactive attempt");
            return DeliveryOutcome::Discarded;
        }

        match delivery.result {
            Ok(receipt) => {
                self.pending = None;
                self.submission_error = None;
                self.receipt = Some(receipt.clone());
                DeliveryOutcome::Applied(receipt)
            }
            Err(err) => {
                warn!(attempt_id = %delivery.attempt_id, error = %err, "report delivery failed");
                self.submission_error = Some(err.to_string());
                DeliveryOutcome::Failed(err)
            }
        }
    }

    /// Send the pending report and apply the result in place.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingReport` when nothing is waiting, `Unmounted` after
    /// `unmount`, or `Submission` when the backend call fails.
    pub async fn deliver(&mut self) -> Result<GradeReceipt, ControllerError> {
        if !self.mounted {
            return Err(ControllerError::Unmounted);
        }
        let task = self.report_task().ok_or(ControllerError::NoPendingReport)?;
        match self.accept_delivery(task.run().await) {
            DeliveryOutcome::Applied(receipt) => Ok(receipt),
            DeliveryOutcome::Failed(err) => Err(err.into()),
            DeliveryOutcome::Discarded => Err(ControllerError::Unmounted),
        }
    }

    /// Re-send a report whose previous delivery failed.
    ///
    /// # Errors
    ///
    /// Same as `deliver`.
    pub async fn retry_submission(&mut self) -> Result<GradeReceipt, ControllerError> {
        if let Some(previous) = &self.submission_error {
            debug!(quiz_id = %self.quiz_id(), previous = %previous, "retrying submission");
        }
        self.deliver().await
    }

    async fn finalize(&mut self) {
        self.stop_countdown();
        self.clear_cache().await;

        let Some(report) = QuizReport::from_session(&self.session, self.attempt_id) else {
            return;
        };
        match self.ports.attempts.append_attempt(&report.to_record()).await {
            Ok(()) | Err(StorageError::Conflict) => {}
            Err(err) => {
                warn!(attempt_id = %self.attempt_id, error = %err, "failed to record attempt");
            }
        }
        self.pending = Some(report);
    }

    async fn write_through(&self) {
        let cached = CachedAnswers {
            answers: self.session.answers().clone(),
            written_at: self.clock.epoch_secs(),
        };
        if let Err(err) = self.ports.cache.save(self.quiz_id(), &cached).await {
            warn!(quiz_id = %self.quiz_id(), error = %err, "failed to cache answers");
        }
    }

    async fn clear_cache(&self) {
        if let Err(err) = self.ports.cache.clear(self.quiz_id()).await {
            warn!(quiz_id = %self.quiz_id(), error = %err, "failed to clear cached answers");
        }
    }

    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.as_mut() {
            handle.cancel();
        }
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("session", &self.session)
            .field("attempt_id", &self.attempt_id)
            .field("mounted", &self.mounted)
            .field("restored", &self.restored)
            .field("pending", &self.pending.is_some())
            .field("receipt", &self.receipt)
            .finish_non_exhaustive()
    }
}

/// Cached answers for `quiz_id` if they exist, parse, and are fresh.
///
/// Stale or corrupt entries are cleared; backend failures are logged and
/// treated as a miss.
async fn restore_answers(
    cache: &dyn AnswerCache,
    quiz_id: QuizId,
    now: i64,
    window: Duration,
) -> Option<Answers> {
    match cache.load(quiz_id).await {
        Ok(None) => None,
        Ok(Some(cached)) if is_within_window(cached.written_at, now, window) => {
            Some(cached.answers)
        }
        Ok(Some(cached)) => {
            debug!(%quiz_id, written_at = cached.written_at, "cached answers expired");
            discard(cache, quiz_id).await;
            None
        }
        Err(CacheError::Parse(reason)) => {
            debug!(%quiz_id, %reason, "discarding unreadable cached answers");
            discard(cache, quiz_id).await;
            None
        }
        Err(err) => {
            warn!(%quiz_id, error = %err, "answer cache unavailable");
            None
        }
    }
}

async fn discard(cache: &dyn AnswerCache, quiz_id: QuizId) {
    if let Err(err) = cache.clear(quiz_id).await {
        warn!(%quiz_id, error = %err, "failed to clear cached answers");
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
