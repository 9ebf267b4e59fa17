//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, Duration, Utc};
use racers_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One day after `now`.
#[must_use]
pub fn tomorrow(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(1)
}

/// One day before `now`.
#[must_use]
pub fn yesterday(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(1)
}
