//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while reading or writing objects.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object stored under the key.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Object already exists and the write required it to be absent.
    #[error("Object already exists: {key}")]
    AlreadyExists { key: String },

    /// Key is not a valid relative object key.
    #[error("Invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Filesystem error while accessing an object.
    #[error("I/O error on {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Creates an I/O error for the given key.
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    /// Whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
