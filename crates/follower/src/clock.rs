//! Time source abstraction.
//!
//! The tip estimator and the reconciler prune both depend on elapsed time.
//! Components never read the wall clock themselves; the orchestrator samples
//! a [`Clock`] and passes timestamps down, so tests can drive time manually.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary per-clock origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock, measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually-advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().expect("clock lock poisoned")
    }
}
