//! Fixed-window per-client rate limiter.
//!
//! Bounded counters keyed by client id, swept opportunistically so the map
//! cannot grow without bound. The core never touches this map directly; it
//! only sees the [`RateLimiter`](super::RateLimiter) seam.

use super::{RateDecision, RateLimiter};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Counter state for one client's current window.
#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    count: u32,
    window_start: DateTime<Utc>,
}

/// In-memory fixed-window limiter.
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    slots: Mutex<HashMap<String, WindowSlot>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window_secs: i64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Drop expired windows. Called opportunistically from `check`.
    fn sweep(slots: &mut HashMap<String, WindowSlot>, now: DateTime<Utc>, window: Duration) {
        slots.retain(|_, slot| now - slot.window_start < window);
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, client_id: &str) -> RateDecision {
        let now = Utc::now();
        let mut slots = self.slots.lock();

        // Sweep once the map is large enough to matter
        if slots.len() > 1024 {
            Self::sweep(&mut slots, now, self.window);
        }

        let slot = slots.entry(client_id.to_string()).or_insert(WindowSlot {
            count: 0,
            window_start: now,
        });

        if now - slot.window_start >= self.window {
            slot.count = 0;
            slot.window_start = now;
        }

        let reset_at = slot.window_start + self.window;
        if slot.count < self.max_requests {
            slot.count += 1;
            RateDecision {
                allowed: true,
                remaining: self.max_requests - slot.count,
                reset_at,
            }
        } else {
            RateDecision {
                allowed: false,
                remaining: 0,
                reset_at,
            }
        }
    }
}

/// A limiter that always allows; useful for tests and offline runs.
pub struct UnlimitedLimiter;

impl RateLimiter for UnlimitedLimiter {
    fn check(&self, _client_id: &str) -> RateDecision {
        RateDecision {
            allowed: true,
            remaining: u32::MAX,
            reset_at: Utc::now(),
        }
    }
}
