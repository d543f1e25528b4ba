//! Wall-clock abstraction used when stamping records.

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of "now" for payload defaults.
///
/// Replaced by [`FixedClock`] in tests so timestamps are deterministic.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as an RFC 3339 string with millisecond precision,
    /// e.g. `2026-10-17T09:30:00.000Z`.
    fn now_iso(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Reads the real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
