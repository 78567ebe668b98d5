//! Timestamp source for the engine.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Logical clock used to stamp dice and journal updates.
///
/// The contract is "monotonic enough": every die created by one roll
/// shares a stamp, and a later mutation never stamps earlier than an
/// older one. That is what makes "the most recent roll" a well-defined
/// group for totals.
pub trait Clock: Send + Sync {
    /// Current timestamp, in whole time units (seconds in production).
    fn now(&self) -> i64;
}

/// Wall-clock seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A hand-driven clock for tests and deterministic replay.
///
/// Time only moves when told to, so refresh-window expiry and roll
/// grouping can be tested without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Jumps the clock to an absolute time.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: i64) {
        self.now.fetch_add(delta, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}
