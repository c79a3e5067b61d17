#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! The engine only ever asks "how long since the origin". Browser hosts pass
//! `performance.now()` into a [`DeterministicClock`]; native hosts can use a
//! [`MonotonicClock`].

use std::time::Duration;

/// Monotonic time since an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Clock advanced explicitly by the host (and by tests).
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set the current time. Moving backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        if now >= self.now {
            self.now = now;
        }
    }

    /// Advance by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now(&self) -> Duration {
        self.now
    }
}

/// Wall-clock backed monotonic time (`web_time::Instant`, so it also works in
/// the browser).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: web_time::Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
