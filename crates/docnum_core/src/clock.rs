//! Time source for the numbering engine.
//!
//! The engine never reads the wall clock directly; production wiring uses
//! `SystemClock`, tests pin time with `FixedClock` or pass `now` per request.

use chrono::{DateTime, Utc};

/// Supplies "now" to the numbering engine.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
