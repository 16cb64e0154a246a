//! Session clocks.
//!
//! A generation session is advanced by an external tick source. In
//! production that source is the wall clock; in tests it is a virtual clock
//! that can be moved forward synchronously, so scenario playback can be
//! exercised without real delays.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of elapsed time for a session's tick loop.
pub trait TickClock: Send {
    /// Time elapsed since the clock was started.
    fn elapsed(&self) -> Duration;
}

/// Monotonic wall-clock time since construction.
#[derive(Debug, Clone)]
pub struct WallTickClock {
    start: Instant,
}

impl WallTickClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallTickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock for WallTickClock {
    #[inline]
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can hold one handle
/// while a session runner polls another.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<Mutex<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = now.saturating_add(delta);
    }

    /// Jump the clock to an absolute elapsed time. Never moves backwards.
    pub fn set(&self, elapsed: Duration) {
        let mut now = self.now.lock().unwrap();
        if elapsed > *now {
            *now = elapsed;
        }
    }
}

impl TickClock for VirtualClock {
    fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}
