//! Error types for the contact queue.

use thiserror::Error;

/// Configuration errors in an eligibility policy or timezone offset.
///
/// These are programming/configuration mistakes, never user input, so callers
/// propagate them instead of recovering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid start hour: {0} (must be in 0..24)")]
    InvalidStartHour(u32),

    #[error("Invalid end hour: {0} (must be in 0..24)")]
    InvalidEndHour(u32),

    #[error("Timezone offset out of range: {0} minutes")]
    OffsetOutOfRange(i32),
}

/// Failures of the batch loader or list provider collaborators.
///
/// The cache does not distinguish these from "not yet available": ids of a failed
/// batch fall back to unknown and stall recovery retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Loader unavailable: {0}")]
    Unavailable(String),

    #[error("Loader timed out after {0} ms")]
    Timeout(u64),
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for QueueError {
    fn from(err: config::ConfigError) -> Self {
        QueueError::ConfigError(err.to_string())
    }
}
