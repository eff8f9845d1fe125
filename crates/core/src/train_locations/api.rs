//! Train Tracker positions API client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::config::TrainLocationsConfig;
use super::error::TrainLocationError;

/// Source of live train positions for a single route.
#[async_trait]
pub trait TrainPositionsApi: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Current positions for `line`, as returned by the API.
    async fn positions(&self, line: &str) -> Result<Value, TrainLocationError>;
}

/// CTA Train Tracker `ttpositions` endpoint.
pub struct CtaTrainTrackerApi {
    client: Client,
    api_url: String,
    api_key: String,
}

impl CtaTrainTrackerApi {
    pub fn new(config: &TrainLocationsConfig) -> Result<Self, TrainLocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrainLocationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TrainPositionsApi for CtaTrainTrackerApi {
    fn name(&self) -> &str {
        "cta_train_tracker"
    }

    async fn positions(&self, line: &str) -> Result<Value, TrainLocationError> {
        let request_error = |message: String| TrainLocationError::Request {
            line: line.to_string(),
            message,
        };

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("rt", line),
                ("key", self.api_key.as_str()),
                ("outputType", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| request_error(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(request_error(format!("HTTP {}", status)));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| request_error(format!("invalid JSON: {}", e.without_url())))?;
        debug!(line, "Fetched train positions");
        Ok(body)
    }
}
