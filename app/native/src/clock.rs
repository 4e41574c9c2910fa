//! Injectable wall clock.
//!
//! The rotation engine never reads the system time directly. Everything goes
//! through a [`Clock`], so schedules can be exercised deterministically.

use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use parking_lot::Mutex;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Returns the current time, carrying the local UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> { Local::now().fixed_offset() }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<FixedOffset>) -> Self { Self { now: Mutex::new(start) } }

    /// Moves the clock to an absolute time. Going backwards is allowed.
    pub fn set(&self, now: DateTime<FixedOffset>) { *self.now.lock() = now; }

    /// Moves the clock forward (or backward, for negative deltas).
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> { *self.now.lock() }
}
