//! Error types for the capture engine.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the capture engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid engine configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid setting.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Log source error.
    #[error("source error: {0}")]
    Source(#[from] logvault_source::SourceError),

    /// The storage root is already owned by another engine.
    #[error("storage root locked: another engine has exclusive access")]
    Locked,
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
