//! Error types for the recall_core library.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recall_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A store file is missing or cannot be read
    #[error("Data unavailable at {path:?}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    /// A store file exists but its content is malformed
    #[error("Data corrupt at {path:?}: {reason}")]
    DataCorrupt { path: PathBuf, reason: String },

    /// Unrecognized session command; the session state is untouched
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors a caller can recover from by re-prompting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidCommand(_))
    }
}
