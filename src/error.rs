use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    /// Unknown category, malformed parameter file or recipe. Raised before anything is written.
    #[error("Invalid benchmark configuration: {0}")]
    ConfigurationError(String),

    /// Recoverable: callers log it and continue.
    #[error("Could not prepare '{}': {reason}", path.display())]
    FilesystemError { path: PathBuf, reason: String },

    /// Terminal state of a local run. The underlying cause is only logged.
    #[error("Workflow execution failed: {0}")]
    ExecutionError(String),

    #[error("Failed to build internal workflow model: {0}")]
    ModelConstructionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
