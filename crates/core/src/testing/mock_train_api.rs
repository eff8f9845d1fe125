//! Mock Train Tracker API.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::train_locations::{TrainLocationError, TrainPositionsApi};

/// Mock implementation of the TrainPositionsApi trait.
///
/// Returns a small positions response per line unless the line has queued
/// failures.
#[derive(Debug, Default)]
pub struct MockTrainPositionsApi {
    failures: Arc<RwLock<HashMap<String, u32>>>,
    calls: Arc<RwLock<HashMap<String, usize>>>,
}

impl MockTrainPositionsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` requests for `line`.
    pub async fn fail_next(&self, line: &str, count: u32) {
        self.failures.write().await.insert(line.to_string(), count);
    }

    /// Get the number of requests made for `line`.
    pub async fn call_count(&self, line: &str) -> usize {
        self.calls.read().await.get(line).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TrainPositionsApi for MockTrainPositionsApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn positions(&self, line: &str) -> Result<Value, TrainLocationError> {
        *self.calls.write().await.entry(line.to_string()).or_default() += 1;

        if let Some(remaining) = self.failures.write().await.get_mut(line) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TrainLocationError::Request {
                    line: line.to_string(),
                    message: "simulated timeout".to_string(),
                });
            }
        }

        Ok(json!({
            "ctatt": {
                "tmst": "2026-02-27T06:00:00",
                "errCd": "0",
                "errNm": null,
                "route": [{
                    "@name": line,
                    "train": [{"rn": "100", "destNm": "Mock", "isApp": "0", "isDly": "0"}]
                }]
            }
        }))
    }
}
