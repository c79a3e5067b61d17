#![forbid(unsafe_code)]

//! Trace stream connection state.
//!
//! ```text
//! Connecting ──open──▶ Open ──close──▶ Closed
//!      │                                 ▲
//!      └──────────────close──────────────┘
//! ```
//!
//! `Closed` only leaves via [`ConnectionState::reconnect`], which the host
//! calls if it decides to retry. The engine never retries on its own.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Connection lifecycle plus frame counters for the current connection.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    status: ConnectionStatus,
    opened_at: Option<Duration>,
    frames_accepted: u64,
    frames_rejected: u64,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            opened_at: None,
            frames_accepted: 0,
            frames_rejected: 0,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, ConnectionStatus::Open)
    }

    /// When the current connection opened, if it is open.
    #[must_use]
    pub const fn opened_at(&self) -> Option<Duration> {
        self.opened_at
    }

    #[must_use]
    pub const fn frames_accepted(&self) -> u64 {
        self.frames_accepted
    }

    #[must_use]
    pub const fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// `Connecting → Open`. Returns whether the transition happened.
    pub fn open(&mut self, now: Duration) -> bool {
        if self.status != ConnectionStatus::Connecting {
            return false;
        }
        self.status = ConnectionStatus::Open;
        self.opened_at = Some(now);
        true
    }

    /// Any state `→ Closed`. Returns whether the status changed.
    pub fn close(&mut self) -> bool {
        if self.status == ConnectionStatus::Closed {
            return false;
        }
        self.status = ConnectionStatus::Closed;
        self.opened_at = None;
        true
    }

    /// `Closed → Connecting`, resetting counters. Returns whether it happened.
    pub fn reconnect(&mut self) -> bool {
        if self.status != ConnectionStatus::Closed {
            return false;
        }
        *self = Self::new();
        true
    }

    pub fn record_accepted(&mut self) {
        self.frames_accepted += 1;
    }

    pub fn record_rejected(&mut self) {
        self.frames_rejected += 1;
    }
}
