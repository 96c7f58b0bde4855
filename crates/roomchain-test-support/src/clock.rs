//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, TimeZone, Utc};
use roomchain_core::event::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock fixed at 2026-10-18 12:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Panics if the date literal is not a valid UTC timestamp.
    #[must_use]
    pub fn at_noon() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
