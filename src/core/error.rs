// Error types for the monitor core.

use std::time::Duration;

use thiserror::Error;

/// Failures at the scheduling boundary (simulator timer, alert auto-hide).
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No tokio runtime is reachable from the calling thread.
    #[error("Timer could not be armed: no async runtime available")]
    SchedulerUnavailable,

    /// A recurring schedule needs a non-zero period whose first deadline
    /// fits on the clock.
    #[error("Invalid tick period: {0:?}")]
    InvalidPeriod(Duration),

    /// The alert expiry does not fit on the clock.
    #[error("Invalid alert duration: {0}ms")]
    InvalidDuration(u64),

    /// The alert controller was closed by shutdown.
    #[error("Alerts are closed")]
    AlertsClosed,
}

/// Failures inside the audio backend. Never escapes the feedback emitter.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The output device could not be opened or the audio thread has exited.
    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(String),
}
