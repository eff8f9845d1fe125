//! Filesystem object store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::StorageError;
use super::traits::{validate_key, ObjectMeta, ObjectStore};

/// Prefix of in-flight temporary files; never reported by `list`.
const TEMP_PREFIX: &str = ".tmp-";

/// Object store backed by a directory tree.
///
/// Key `a/b/c.txt` is stored at `<root>/a/b/c.txt`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, s| p.join(s)))
    }

    /// Writes `data` to a temporary file next to `path` and returns the temp path.
    async fn write_temp(&self, key: &str, path: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        let temp_path = parent.join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        file.write_all(data)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(key, e))?;

        Ok(temp_path)
    }

    async fn meta_for(key: &str, path: &Path) -> Result<ObjectMeta, StorageError> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::io(key, e)
            }
        })?;

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(ObjectMeta {
            key: key.to_string(),
            size_bytes: metadata.len(),
            last_modified,
        })
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError> {
        let path = self.path_for(key)?;
        let temp_path = self.write_temp(key, &path, &data).await?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::io(key, e));
        }

        debug!(key = key, bytes = data.len(), "Stored object");
        Self::meta_for(key, &path).await
    }

    async fn put_if_absent(&self, key: &str, data: Vec<u8>) -> Result<ObjectMeta, StorageError> {
        let path = self.path_for(key)?;
        if fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(key, e))?
        {
            return Err(StorageError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let temp_path = self.write_temp(key, &path, &data).await?;

        // hard_link fails if the destination exists, which makes creation atomic
        let linked = fs::hard_link(&temp_path, &path).await;
        let _ = fs::remove_file(&temp_path).await;
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(StorageError::io(key, e)),
        }

        debug!(key = key, bytes = data.len(), "Created object");
        Self::meta_for(key, &path).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::io(key, e)
            }
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        // Only walk the deepest directory the prefix fully names.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let start = if dir_part.is_empty() {
            self.root.clone()
        } else {
            validate_key(dir_part)?;
            dir_part.split('/').fold(self.root.clone(), |p, s| p.join(s))
        };

        let mut objects = Vec::new();
        let mut pending = vec![(start, dir_part.to_string())];

        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io(prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(prefix, e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(TEMP_PREFIX) {
                    continue;
                }
                let key = if dir_key.is_empty() {
                    name
                } else {
                    format!("{}/{}", dir_key, name)
                };

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(&key, e))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    objects.push(Self::meta_for(&key, &entry.path()).await?);
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
