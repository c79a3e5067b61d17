#![forbid(unsafe_code)]

//! Host-driven session wrapper shared by the wasm facade and native tests.
//!
//! JS hosts speak milliseconds (`performance.now()`), listing JSON, and raw
//! relation ids; this adapts those to a [`Session`] running on a
//! [`DeterministicClock`]. Every call that carries a timestamp sets the clock
//! first, so time only moves when the host says so.

use std::time::Duration;

use bufwatch_core::{
    Admission, Clock, Config, ConnectionStatus, DeterministicClock, EntityId, GridGeometry,
    ListError, MountError, RefreshOutcome, Session, Surface, TeardownReport,
};

use crate::listing::JsonListing;

/// A [`Session`] addressed in host units.
#[derive(Debug)]
pub struct HostDriver<S: Surface> {
    session: Session<S, DeterministicClock>,
    listing: JsonListing,
}

impl<S: Surface> HostDriver<S> {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(config, DeterministicClock::new()),
            listing: JsonListing::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session<S, DeterministicClock> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S, DeterministicClock> {
        &mut self.session
    }

    /// Advance the clock to `now_ms`. Earlier timestamps are ignored.
    pub fn set_time_ms(&mut self, now_ms: f64) {
        self.session.clock_mut().set(duration_from_ms(now_ms));
    }

    /// Replace the listing with a freshly fetched body.
    ///
    /// On a parse failure the previous listing is kept.
    pub fn set_entities(&mut self, json: &str) -> Result<RefreshOutcome, ListError> {
        self.listing.set_body(json);
        self.session.refresh(&mut self.listing)
    }

    /// Select every listed relation; returns the ids now needing a surface.
    pub fn select_all(&mut self) -> Vec<u32> {
        self.session
            .select_all()
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    pub fn toggle(&mut self, id: u32) -> bool {
        self.session.toggle(EntityId(id))
    }

    pub fn mount(&mut self, id: u32, surface: S) -> Result<GridGeometry, MountError> {
        self.session.mount(EntityId(id), surface)
    }

    pub fn unmount(&mut self, id: u32) -> Option<S> {
        self.session.unmount(EntityId(id))
    }

    /// Admit one binary frame received at `now_ms`.
    pub fn feed(&mut self, bytes: &[u8], now_ms: f64) -> Option<Admission> {
        self.set_time_ms(now_ms);
        self.session.on_frame(bytes)
    }

    /// Clear highlights due at `now_ms`; returns how many were cleared.
    pub fn tick(&mut self, now_ms: f64) -> usize {
        self.set_time_ms(now_ms);
        self.session.tick()
    }

    /// The stream connected at `now_ms`. A reopen after a close starts a
    /// fresh connection.
    pub fn connection_opened(&mut self, now_ms: f64) {
        self.set_time_ms(now_ms);
        if self.session.connection_status() == ConnectionStatus::Closed {
            self.session.connection_retrying();
        }
        self.session.connection_opened();
    }

    pub fn connection_closed(&mut self) {
        self.session.connection_closed();
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.connection().is_open()
    }

    /// Earliest pending clear in host milliseconds, for `setTimeout` hosts.
    #[must_use]
    pub fn next_deadline_ms(&mut self) -> Option<f64> {
        self.session.next_deadline().map(duration_to_ms)
    }

    /// Current clock reading in host milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        duration_to_ms(self.session.clock().now())
    }

    pub fn teardown(self) -> TeardownReport {
        self.session.teardown()
    }
}

/// Host timestamps are kept at microsecond resolution. Non-finite and
/// negative timestamps read as zero.
fn duration_from_ms(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_micros((ms * 1000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
