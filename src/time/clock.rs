//! Clock abstraction for deterministic timing.
//!
//! The perception state machine never reads wall-clock time itself: every
//! `update` and `tick` takes an explicit `now_ms`. This module provides the
//! clock that produces those readings in production, while tests simply pass
//! hand-picked values.

use std::time::Instant;

/// Source of monotonic millisecond readings.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin. Must never go backward.
    fn now_ms(&self) -> u64;
}

/// Monotonic clock anchored at construction time.
#[derive(Debug, Clone)]
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
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
