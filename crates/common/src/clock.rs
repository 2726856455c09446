//! Wall-clock abstraction for testability
//!
//! Token expiry and request timestamps are computed through [`Clock`] so
//! tests can move time forward without sleeping.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use payx_common::clock::{Clock, MockClock};
//!
//! let clock = MockClock::default();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!((clock.now() - start).num_seconds(), 5);
//! ```

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync + Debug {
    /// Current wall-clock time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock shared between the authenticator and the request builder.
pub type SharedClock = Arc<dyn Clock>;

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same underlying instant, so advancing one handle is
/// observed by every component holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let delta = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        if let Some(next) = current.checked_add_signed(delta) {
            *current = next;
        }
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for clock.
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_mock_clock_is_frozen_until_advanced() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = MockClock::new(start);

        assert_eq!(clock.now(), start);
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
    }

    #[test]
    fn test_mock_clock_clones_share_time() {
        let clock = MockClock::default();
        let handle = clock.clone();
        let before = clock.now();

        handle.advance(Duration::from_secs(3600));

        assert_eq!((clock.now() - before).num_seconds(), 3600);
    }

    #[test]
    fn test_mock_clock_set() {
        let clock = MockClock::default();
        let target = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
