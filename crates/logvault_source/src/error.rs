//! Error types for log source operations.

use std::io;
use thiserror::Error;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while reading from a log source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source command could not be started.
    #[error("failed to spawn log command `{command}`: {reason}")]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// Why it failed.
        reason: String,
    },

    /// The source has been closed and can no longer be read.
    #[error("log source is closed")]
    Closed,
}

impl SourceError {
    /// Creates a spawn error.
    pub fn spawn(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Spawn {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
