//! Mock fetch and transform tasks for orchestrator tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::task::{DerivedArtifact, FetchStatus, FetchTask, RawArtifact, TaskError, TransformTask};

/// Mock implementation of the FetchTask trait.
///
/// Returns the configured status on every call (default `Unchanged`) unless
/// an error is queued with [`MockFetchTask::set_next_error`].
#[derive(Debug)]
pub struct MockFetchTask {
    status: Arc<RwLock<FetchStatus>>,
    next_error: Arc<RwLock<Option<TaskError>>>,
    delay_ms: Arc<RwLock<u64>>,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockFetchTask {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetchTask {
    pub fn new() -> Self {
        Self {
            status: Arc::new(RwLock::new(FetchStatus::Unchanged)),
            next_error: Arc::new(RwLock::new(None)),
            delay_ms: Arc::new(RwLock::new(0)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Set the status returned by subsequent fetches.
    pub async fn set_status(&self, status: FetchStatus) {
        *self.status.write().await = status;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: TaskError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make each fetch take this long.
    pub async fn set_delay_ms(&self, delay_ms: u64) {
        *self.delay_ms.write().await = delay_ms;
    }

    /// Get the number of fetches performed.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl FetchTask for MockFetchTask {
    fn name(&self) -> &str {
        "mock_fetch"
    }

    async fn fetch(&self) -> Result<FetchStatus, TaskError> {
        *self.calls.write().await += 1;

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.status.read().await.clone())
    }
}

/// Mock implementation of the TransformTask trait.
///
/// Records every raw artifact it is given and derives a fixed output key.
#[derive(Debug)]
pub struct MockTransformTask {
    inputs: Arc<RwLock<Vec<RawArtifact>>>,
    next_error: Arc<RwLock<Option<TaskError>>>,
    delay_ms: Arc<RwLock<u64>>,
}

impl Default for MockTransformTask {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransformTask {
    pub fn new() -> Self {
        Self {
            inputs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Configure the next transform to fail with the given error.
    pub async fn set_next_error(&self, error: TaskError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make each transform take this long.
    pub async fn set_delay_ms(&self, delay_ms: u64) {
        *self.delay_ms.write().await = delay_ms;
    }

    /// Raw artifacts passed to `transform`, in call order.
    pub async fn recorded_inputs(&self) -> Vec<RawArtifact> {
        self.inputs.read().await.clone()
    }

    /// Get the number of transforms performed.
    pub async fn call_count(&self) -> usize {
        self.inputs.read().await.len()
    }
}

#[async_trait]
impl TransformTask for MockTransformTask {
    fn name(&self) -> &str {
        "mock_transform"
    }

    async fn transform(&self, raw: &RawArtifact) -> Result<DerivedArtifact, TaskError> {
        self.inputs.write().await.push(raw.clone());

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(DerivedArtifact {
            key: "derived/mock.csv".to_string(),
            rows: raw.files.len(),
            source_version: raw.version,
        })
    }
}
