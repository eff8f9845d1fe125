//! Error type shared by pipeline tasks.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::storage::StorageError;

/// Errors a task invocation can fail with.
///
/// The orchestrator does not distinguish between variants: any error routes
/// the run to the failure notification.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// The upstream source could not be reached or returned an error.
    #[error("Upstream source error: {0}")]
    Source(String),

    /// Upstream response had no `Last-Modified` header.
    #[error("Last-Modified header not found in the response")]
    MissingLastModified,

    /// `Last-Modified` header could not be parsed.
    #[error("Invalid Last-Modified header: {0}")]
    InvalidLastModified(String),

    /// Feed archive could not be read.
    #[error("Invalid feed archive: {0}")]
    Archive(String),

    /// A required input object does not exist.
    #[error("Missing input object: {key}")]
    MissingInput { key: String },

    /// An input file could not be parsed.
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Encode(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkpoint persistence failure.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl TaskError {
    /// Creates a parse error for the given file.
    pub fn parse(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }
}
