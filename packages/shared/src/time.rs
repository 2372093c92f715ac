//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock for tests: starts at a fixed instant and advances by a fixed step on
/// every call, so consecutive records get strictly increasing timestamps.
#[derive(Debug)]
pub struct FixedClock {
    start: DateTime<Utc>,
    step: Duration,
    ticks: std::sync::atomic::AtomicI32,
}

impl FixedClock {
    /// A clock that always returns `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::stepping(start, Duration::zero())
    }

    /// A clock that returns `start`, `start + step`, `start + 2 * step`, ...
    pub fn stepping(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step,
            ticks: std::sync::atomic::AtomicI32::new(0),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self
            .ticks
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.start + self.step * tick
    }
}

/// Format an instant as RFC 3339 with millisecond precision (`2024-01-01T00:00:00.000Z`).
pub fn to_rfc3339_millis(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
