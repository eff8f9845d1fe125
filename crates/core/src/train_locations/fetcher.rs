//! Per-minute train position fetch.

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::metrics;
use crate::storage::ObjectStore;

use super::api::TrainPositionsApi;
use super::config::TrainLocationsConfig;
use super::error::TrainLocationError;
use super::partition_prefix;
use super::records::PositionsSample;

/// Result of one fetch across all lines.
#[derive(Debug, Clone, Serialize)]
pub struct TrainFetchSummary {
    pub timestamp: DateTime<Utc>,
    /// Object the sample was written to.
    pub key: String,
    /// Number of line responses in the sample.
    pub count: usize,
    /// Lines that failed after all retries.
    pub failed_lines: Vec<String>,
}

/// Polls every configured line and lands one gzipped sample per call.
pub struct TrainLocationFetcher {
    config: TrainLocationsConfig,
    api: Arc<dyn TrainPositionsApi>,
    store: Arc<dyn ObjectStore>,
}

impl TrainLocationFetcher {
    pub fn new(
        config: TrainLocationsConfig,
        api: Arc<dyn TrainPositionsApi>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self { config, api, store }
    }

    /// Fetch all lines concurrently and store the combined sample.
    pub async fn fetch(&self) -> Result<TrainFetchSummary, TrainLocationError> {
        if self.config.api_key.trim().is_empty() {
            return Err(TrainLocationError::MissingApiKey);
        }

        let timestamp = Utc::now();
        info!(lines = self.config.lines.len(), api = self.api.name(), "Fetching train locations");

        let results = join_all(self.config.lines.iter().map(|line| self.fetch_line(line))).await;

        let mut data = Vec::with_capacity(results.len());
        let mut failed_lines = Vec::new();
        for (line, result) in self.config.lines.iter().zip(results) {
            match result {
                Ok(value) => data.push(value),
                Err(_) => failed_lines.push(line.clone()),
            }
        }

        let sample = PositionsSample {
            timestamp: Some(timestamp.to_rfc3339()),
            data,
        };
        let count = sample.data.len();
        let body = encode_sample(&sample)?;

        let key = format!(
            "{}{}-{}.json.gz",
            partition_prefix(&self.config.raw_prefix, timestamp.date_naive()),
            timestamp.format("%H%M%S"),
            uuid::Uuid::new_v4()
        );
        self.store.put(&key, body).await?;
        info!(key = %key, count, failed = failed_lines.len(), "Stored train location sample");

        Ok(TrainFetchSummary {
            timestamp,
            key,
            count,
            failed_lines,
        })
    }

    /// Fetch one line, retrying with exponential backoff.
    async fn fetch_line(&self, line: &str) -> Result<Value, TrainLocationError> {
        let attempts = self.config.max_retries + 1;
        let mut attempt: u32 = 0;
        loop {
            match self.api.positions(line).await {
                Ok(value) => {
                    metrics::TRAIN_LOCATION_FETCHES
                        .with_label_values(&[line, "success"])
                        .inc();
                    info!(line, "Successfully fetched data for route");
                    return Ok(value);
                }
                Err(e) if attempt < self.config.max_retries => {
                    let wait = Duration::from_millis(
                        self.config.retry_base_ms.saturating_mul(1u64 << attempt.min(16)),
                    );
                    metrics::TRAIN_LOCATION_FETCHES
                        .with_label_values(&[line, "retry"])
                        .inc();
                    warn!(
                        line,
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    metrics::TRAIN_LOCATION_FETCHES
                        .with_label_values(&[line, "failed"])
                        .inc();
                    error!(line, attempts, error = %e, "Request failed after all attempts");
                    return Err(e);
                }
            }
        }
    }
}

/// Newline-terminated JSON, gzip-compressed.
fn encode_sample(sample: &PositionsSample) -> Result<Vec<u8>, TrainLocationError> {
    let mut payload =
        serde_json::to_vec(sample).map_err(|e| TrainLocationError::Encode(e.to_string()))?;
    payload.push(b'\n');

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&payload)
        .map_err(|e| TrainLocationError::Encode(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| TrainLocationError::Encode(e.to_string()))
}
