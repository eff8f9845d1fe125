//! Upstream feed download.

use async_trait::async_trait;
use reqwest::header::LAST_MODIFIED;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::GtfsConfig;
use crate::task::TaskError;

/// A downloaded feed.
#[derive(Debug, Clone)]
pub struct FeedDownload {
    /// Raw `Last-Modified` header value, if present.
    pub last_modified: Option<String>,
    /// Response body (the zip archive).
    pub body: Vec<u8>,
}

/// Where the GTFS feed comes from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Location of the feed, empty when unconfigured.
    fn url(&self) -> &str;

    /// Download the feed.
    async fn download(&self) -> Result<FeedDownload, TaskError>;
}

/// Downloads the feed over HTTP(S).
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(config: &GtfsConfig) -> Result<Self, TaskError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TaskError::Source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.feed_url.clone(),
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<FeedDownload, TaskError> {
        debug!(url = %self.url, "Requesting GTFS feed");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                TaskError::Source(format!("request to {} timed out", self.url))
            } else {
                TaskError::Source(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaskError::Source(format!("HTTP {} from {}", status, self.url)));
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| TaskError::Source(format!("Failed to read response body: {}", e)))?
            .to_vec();

        Ok(FeedDownload {
            last_modified,
            body,
        })
    }
}
