//! Error types for admission control.

use thiserror::Error;

/// Errors produced by admission-control components.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdmissionError {
    /// The forecast port could not produce a usable snapshot.
    #[error("forecast unavailable: {0}")]
    ForecastUnavailable(String),
    /// The task source kept failing after every retry attempt.
    #[error("remote unavailable: {operation} failed after {attempts} attempts: {last_error}")]
    RemoteUnavailable {
        /// Operation that was attempted (e.g. `list_pending`).
        operation: String,
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Last error observed.
        last_error: String,
    },
    /// Queue had nothing to hand out. Control flow, not a failure.
    #[error("queue is empty")]
    EmptyQueue,
    /// Missing or invalid configuration (fatal at startup).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Operator supplied an override outside of `[0, 100]`.
    #[error("invalid override: {0}")]
    InvalidOverride(String),
    /// A task record from the job system failed validation.
    #[error("invalid task record: {0}")]
    InvalidTask(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
