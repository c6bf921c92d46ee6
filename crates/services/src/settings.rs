use std::time::Duration;

use quiz_core::model::Quiz;

/// Runtime knobs for quiz sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    tick_period: Duration,
    cache_window: Option<Duration>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            cache_window: None,
        }
    }
}

impl QuizSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How often the countdown fires. Each firing removes one second.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        if !period.is_zero() {
            self.tick_period = period;
        }
        self
    }

    /// Override how long cached answers stay resumable.
    #[must_use]
    pub fn with_cache_window(mut self, window: Duration) -> Self {
        self.cache_window = Some(window);
        self
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Resume window for a quiz: the override, else the quiz time limit.
    ///
    /// Overrides too large for `chrono` saturate at `chrono::Duration::MAX`.
    #[must_use]
    pub fn cache_window_for(&self, quiz: &Quiz) -> chrono::Duration {
        match self.cache_window {
            Some(window) => chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            None => chrono::Duration::seconds(i64::from(quiz.time_limit_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId, QuizId};

    fn quiz(limit: u32) -> Quiz {
        let q = Question::new(QuestionId::new(1), "Q", vec!["A".into()], "A").unwrap();
        Quiz::new(QuizId::new(1), "T", vec![q], 50, limit).unwrap()
    }

    #[test]
    fn window_follows_time_limit() {
        let settings = QuizSettings::new();
        assert_eq!(settings.cache_window_for(&quiz(600)).num_seconds(), 600);
        assert_eq!(settings.cache_window_for(&quiz(0)).num_seconds(), 1800);
    }

    #[test]
    fn override_wins_and_zero_period_is_ignored() {
        let settings = QuizSettings::new()
            .with_cache_window(Duration::from_secs(30))
            .with_tick_period(Duration::ZERO);
        assert_eq!(settings.cache_window_for(&quiz(600)).num_seconds(), 30);
        assert_eq!(settings.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn huge_override_saturates() {
        let settings = QuizSettings::new().with_cache_window(Duration::from_secs(100_000_000_000_000_000));
        assert_eq!(settings.cache_window_for(&quiz(600)), chrono::Duration::MAX);

        let settings = QuizSettings::new().with_cache_window(Duration::MAX);
        assert_eq!(settings.cache_window_for(&quiz(600)), chrono::Duration::MAX);
    }
}
