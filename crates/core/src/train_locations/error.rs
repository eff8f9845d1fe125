//! Error types for train location ingestion.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while fetching or processing train locations.
#[derive(Debug, Error)]
pub enum TrainLocationError {
    /// No Train Tracker API key is configured.
    #[error("Missing required configuration: train_locations.api_key")]
    MissingApiKey,

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Request for a single line failed.
    #[error("Request for {line} route failed: {message}")]
    Request { line: String, message: String },

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Encode(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
