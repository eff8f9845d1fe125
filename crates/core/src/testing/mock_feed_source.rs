//! Mock GTFS feed source.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{FeedDownload, FeedSource};
use crate::task::TaskError;

/// Mock implementation of the FeedSource trait.
///
/// Serves the configured download on every call until an error is queued.
#[derive(Debug)]
pub struct MockFeedSource {
    url: String,
    response: Arc<RwLock<Option<FeedDownload>>>,
    next_error: Arc<RwLock<Option<TaskError>>>,
    downloads: Arc<RwLock<usize>>,
}

impl Default for MockFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeedSource {
    /// Create a source with no response configured.
    pub fn new() -> Self {
        Self::with_url("http://mock.local/google_transit.zip")
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            response: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            downloads: Arc::new(RwLock::new(0)),
        }
    }

    /// Create a source serving `body` with the given `Last-Modified` header.
    pub fn with_feed(last_modified: &str, body: Vec<u8>) -> Self {
        let source = Self::new();
        let download = FeedDownload {
            last_modified: Some(last_modified.to_string()),
            body,
        };
        Self {
            response: Arc::new(RwLock::new(Some(download))),
            ..source
        }
    }

    /// Set the response for subsequent downloads.
    pub async fn set_response(&self, last_modified: Option<&str>, body: Vec<u8>) {
        *self.response.write().await = Some(FeedDownload {
            last_modified: last_modified.map(str::to_string),
            body,
        });
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_error(&self, error: TaskError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get the number of downloads performed.
    pub async fn download_count(&self) -> usize {
        *self.downloads.read().await
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<FeedDownload, TaskError> {
        *self.downloads.write().await += 1;

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.response
            .read()
            .await
            .clone()
            .ok_or_else(|| TaskError::Source("no mock response configured".to_string()))
    }
}
