// src/utils/errors.rs
//! Engine error types
//!
//! Protocol outcomes (Fail, Trapped, Deadlocked) are not errors; they are
//! values of [`Response`](crate::grid::Response). Errors only come out of
//! bootstrap, configuration, trace collection and export.

use thiserror::Error;

/// Result alias used across the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised outside the arbitration protocol
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration values that cannot describe a runnable simulation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Every trace sender was dropped before all travelers reported
    #[error("Trace sink closed after {received} of {expected} traces")]
    TraceSinkClosed { expected: usize, received: usize },

    /// Report could not be serialized
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// A traveler task panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::TaskFailed(err.to_string())
    }
}
