//! GTFS fetch task implementation.

use async_trait::async_trait;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::metrics;
use crate::storage::{ObjectStore, StorageError};
use crate::task::{FetchStatus, FetchTask, RawArtifact, TaskError};

use super::source::FeedSource;

/// Fetches the GTFS feed and lands new versions in object storage.
pub struct GtfsFetchTask {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn ObjectStore>,
    checkpoints: CheckpointStore,
    raw_prefix: String,
}

impl GtfsFetchTask {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn ObjectStore>,
        checkpoints: CheckpointStore,
        raw_prefix: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            checkpoints,
            raw_prefix: raw_prefix.into(),
        }
    }

    /// Prefix a given feed version is stored under.
    pub fn version_prefix(&self, version: &Checkpoint) -> String {
        format!("{}version={}/", self.raw_prefix, version.version_label())
    }

    /// Reads every non-directory entry of the archive into memory.
    fn extract_archive(body: Vec<u8>) -> Result<Vec<(String, Vec<u8>)>, TaskError> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(body)).map_err(|e| TaskError::Archive(e.to_string()))?;

        let mut files = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| TaskError::Archive(e.to_string()))?;
            let name = entry.name().to_string();
            if entry.is_dir() {
                debug!(entry = %name, "Skipping directory entry");
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| TaskError::Archive(format!("{}: {}", name, e)))?;
            files.push((name, data));
        }
        Ok(files)
    }

    /// Writes all files under `prefix`. Objects that already exist are kept as-is.
    async fn store_files(
        &self,
        prefix: &str,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<String>, TaskError> {
        let mut stored = Vec::with_capacity(files.len());
        for (name, data) in files {
            let key = format!("{}{}", prefix, name);
            info!(file = %name, key = %key, "Uploading GTFS file");
            match self.store.put_if_absent(&key, data).await {
                Ok(_) => metrics::RAW_FILES_STORED.inc(),
                Err(StorageError::AlreadyExists { .. }) => {
                    debug!(key = %key, "GTFS file already stored, keeping existing object");
                }
                Err(e) => {
                    error!(file = %name, error = %e, "Error uploading GTFS file");
                    return Err(e.into());
                }
            }
            stored.push(name);
        }
        Ok(stored)
    }
}

#[async_trait]
impl FetchTask for GtfsFetchTask {
    fn name(&self) -> &str {
        "gtfs_data_fetch"
    }

    async fn fetch(&self) -> Result<FetchStatus, TaskError> {
        if self.source.url().trim().is_empty() {
            return Err(TaskError::MissingConfig("gtfs.feed_url".to_string()));
        }
        if self.raw_prefix.is_empty() {
            return Err(TaskError::MissingConfig("storage.raw_prefix".to_string()));
        }

        info!(url = %self.source.url(), "Fetching GTFS data");
        let download = self.source.download().await?;
        info!(bytes = download.body.len(), "Fetched GTFS data");

        let header = download.last_modified.ok_or_else(|| {
            error!("Last-Modified header not found in the response");
            TaskError::MissingLastModified
        })?;
        let upstream = Checkpoint::from_http_date(&header)
            .ok_or_else(|| TaskError::InvalidLastModified(header.clone()))?;

        let current = self.checkpoints.load()?;
        if let Some(current) = current {
            if current >= upstream {
                info!(
                    checkpoint = %current,
                    upstream = %upstream,
                    "GTFS data has not been updated since last fetch, no action taken"
                );
                return Ok(FetchStatus::Unchanged);
            }
        }

        info!(
            previous = ?current.map(|c| c.to_string()),
            upstream = %upstream,
            "GTFS data has been updated since last fetch, storing new version"
        );

        let body = download.body;
        let files = tokio::task::spawn_blocking(move || Self::extract_archive(body))
            .await
            .map_err(|e| TaskError::Archive(format!("extraction task failed: {}", e)))??;

        let prefix = self.version_prefix(&upstream);
        let stored = self.store_files(&prefix, files).await?;
        info!(files = stored.len(), prefix = %prefix, "Stored GTFS data");

        self.checkpoints.advance(upstream)?;

        Ok(FetchStatus::Updated(RawArtifact {
            version: upstream,
            prefix,
            files: stored,
        }))
    }
}
