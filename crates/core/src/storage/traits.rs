//! Trait definitions for the storage module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Last write time.
    pub last_modified: DateTime<Utc>,
}

/// A key/value blob store with prefix listing.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Writes an object, replacing any existing object under the key.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError>;

    /// Writes an object only if no object exists under the key.
    ///
    /// Fails with [`StorageError::AlreadyExists`] otherwise and leaves the
    /// stored object untouched.
    async fn put_if_absent(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError>;

    /// Reads an object.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether an object exists under the key.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Lists objects whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError>;
}

/// Checks that a key is a non-empty relative path without `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.starts_with('/') {
        return Err(invalid("key must be relative"));
    }
    if key.contains('\\') {
        return Err(invalid("key must use '/' separators"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("key contains an empty segment")),
            "." | ".." => return Err(invalid("key contains a relative segment")),
            _ => {}
        }
    }
    Ok(())
}
