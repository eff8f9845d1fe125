//! In-memory object store for tests and local dry runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::error::StorageError;
use super::traits::{validate_key, ObjectMeta, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    meta: ObjectMeta,
}

/// In-memory object store.
///
/// Besides the [`ObjectStore`] contract it counts successful writes and can
/// be told to fail writes to matching keys, which makes it useful for
/// asserting "no writes happened" and partial-failure paths.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    writes: RwLock<usize>,
    fail_writes_containing: RwLock<Option<String>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation.
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Make every write to a key containing `pattern` fail.
    pub async fn fail_writes_containing(&self, pattern: impl Into<String>) {
        *self.fail_writes_containing.write().await = Some(pattern.into());
    }

    /// Stop failing writes.
    pub async fn clear_write_failures(&self) {
        *self.fail_writes_containing.write().await = None;
    }

    async fn check_write(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        if let Some(pattern) = self.fail_writes_containing.read().await.as_deref() {
            if key.contains(pattern) {
                return Err(StorageError::Backend(format!(
                    "simulated write failure for {}",
                    key
                )));
            }
        }
        Ok(())
    }

    async fn insert(&self, key: &str, data: Vec<u8>) -> ObjectMeta {
        let meta = ObjectMeta {
            key: key.to_string(),
            size_bytes: data.len() as u64,
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                meta: meta.clone(),
            },
        );
        *self.writes.write().await += 1;
        meta
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError> {
        self.check_write(key).await?;
        Ok(self.insert(key, data).await)
    }

    async fn put_if_absent(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError> {
        self.check_write(key).await?;
        if self.objects.read().await.contains_key(key) {
            return Err(StorageError::AlreadyExists {
                key: key.to_string(),
            });
        }
        Ok(self.insert(key, data).await)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, o)| o.meta.clone())
            .collect())
    }
}
