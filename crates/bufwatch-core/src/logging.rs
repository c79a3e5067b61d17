#![forbid(unsafe_code)]

//! Logging setup.
//!
//! The engine logs through `tracing` unconditionally; installing a subscriber
//! is up to the host. Native hosts can enable the `tracing-json` feature and
//! call [`init_json`] for structured JSON lines filtered by `BUFWATCH_LOG`
//! (an `EnvFilter` directive string, default `info`).
//!
//! Targets used by the engine:
//!
//! - `trace`: per-event admission and grid paints (very noisy).
//! - `debug`: listing refreshes, mounts, unmounts, cancellations.
//! - `info`: connection transitions, teardown.
//! - `warn`: malformed frames, listing failures, mount failures.

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "BUFWATCH_LOG";

/// Default directives when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Install a global JSON subscriber.
///
/// Fails if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json() -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| LoggingError(err.to_string()))
}

/// A subscriber could not be installed.
#[cfg(feature = "tracing-json")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingError(pub String);

#[cfg(feature = "tracing-json")]
impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

#[cfg(feature = "tracing-json")]
impl std::error::Error for LoggingError {}
