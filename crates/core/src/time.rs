use chrono::{DateTime, Duration, Utc};

/// Source of "now" for quiz sessions.
///
/// Services take a `Clock` by value so tests can pin time and step it forward
/// while the real binary reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a clock pinned at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Current time as whole seconds since the Unix epoch.
    #[must_use]
    pub fn epoch_secs(&self) -> i64 {
        self.now().timestamp()
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Returns true when a write stamped at `written_at` (epoch seconds) is still
/// inside `window` at `now`.
///
/// A stamp from the future counts as fresh.
#[must_use]
pub fn is_within_window(written_at: i64, now: i64, window: Duration) -> bool {
    let age = now.saturating_sub(written_at);
    age <= window.num_seconds()
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` pinned at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.epoch_secs(), FIXED_TEST_TIMESTAMP + 90);
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::system();
        clock.advance(Duration::days(365));
        assert!(!clock.is_fixed());
        assert!(clock.now() < Utc::now() + Duration::days(1));
    }

    #[test]
    fn window_is_inclusive_at_the_edge() {
        let window = Duration::seconds(1800);
        assert!(is_within_window(1_000, 2_800, window));
        assert!(!is_within_window(1_000, 2_801, window));
    }

    #[test]
    fn future_stamp_is_fresh() {
        assert!(is_within_window(5_000, 1_000, Duration::seconds(10)));
    }
}
