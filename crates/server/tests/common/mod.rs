//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the real router around
//! in-memory stores and mock upstreams, so the API can be exercised without
//! network access or a running server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cta_pipeline_core::{
    checkpoint::{CheckpointStore, MemoryParameterStore, ParameterStore},
    fetcher::FeedSource,
    storage::MemoryObjectStore,
    testing::{
        MockFeedSource, MockFetchTask, MockNotifier, MockTrainPositionsApi, MockTransformTask,
    },
    train_locations::TrainPositionsApi,
    Config, ExpectedScheduleTask, FetchTask, GtfsFetchTask, Notifier, ObjectStore,
    PipelineOrchestrator, TrainLocationFetcher, TrainLocationProcessor, TrainLocationsConfig,
    TransformTask,
};
use cta_pipeline_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use cta_pipeline_core::testing::fixtures;

pub const PARAMETER_NAME: &str = "gtfs_last_modified_time";

/// Test fixture wrapping the router and the mocks behind it.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_manual_run() {
///     let fixture = TestFixture::new().await;
///     fixture.source.set_response(Some(fixtures::GTFS_LAST_MODIFIED), fixtures::gtfs_zip()).await;
///
///     let response = fixture.post("/api/v1/pipeline/runs", Value::Null).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock GTFS feed, used when the real fetch task is wired
    pub source: Arc<MockFeedSource>,
    /// Mock fetch task, used when `TestConfig::slow_fetch_ms` is set
    pub fetch_task: Arc<MockFetchTask>,
    /// Mock failure notifier
    pub notifier: Arc<MockNotifier>,
    /// Mock Train Tracker API
    pub train_api: Arc<MockTrainPositionsApi>,
    /// Object store shared by every task
    pub store: Arc<MemoryObjectStore>,
    /// Parameter store holding the checkpoint
    pub params: Arc<MemoryParameterStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Real GTFS tasks over an unconfigured feed, train locations disabled.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let source = Arc::new(MockFeedSource::new());
        let fetch_task = Arc::new(MockFetchTask::new());
        let notifier = Arc::new(MockNotifier::new());
        let train_api = Arc::new(MockTrainPositionsApi::new());
        let store = Arc::new(MemoryObjectStore::new());
        let params = Arc::new(MemoryParameterStore::new());

        let mut config = Config::default();
        config.orchestrator.enabled = false;
        config.notifier.subscribers = vec!["http://hooks.local/secret-token".to_string()];
        config.train_locations = TrainLocationsConfig {
            enabled: test_config.enable_train_locations,
            api_key: "secret-api-key".to_string(),
            lines: vec!["red".to_string(), "blue".to_string()],
            retry_base_ms: 1,
            ..Default::default()
        };

        let object_store = Arc::clone(&store) as Arc<dyn ObjectStore>;

        let (fetch, transform): (Arc<dyn FetchTask>, Arc<dyn TransformTask>) =
            match test_config.slow_fetch_ms {
                Some(delay_ms) => {
                    fetch_task.set_delay_ms(delay_ms).await;
                    (
                        Arc::clone(&fetch_task) as Arc<dyn FetchTask>,
                        Arc::new(MockTransformTask::new()) as Arc<dyn TransformTask>,
                    )
                }
                None => {
                    let checkpoints = CheckpointStore::new(
                        Arc::clone(&params) as Arc<dyn ParameterStore>,
                        PARAMETER_NAME,
                    );
                    let fetch = GtfsFetchTask::new(
                        Arc::clone(&source) as Arc<dyn FeedSource>,
                        Arc::clone(&object_store),
                        checkpoints,
                        config.storage.raw_prefix.clone(),
                    );
                    let transform = ExpectedScheduleTask::new(
                        Arc::clone(&object_store),
                        config.storage.derived_prefix.clone(),
                    );
                    (
                        Arc::new(fetch) as Arc<dyn FetchTask>,
                        Arc::new(transform) as Arc<dyn TransformTask>,
                    )
                }
            };

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            config.orchestrator.clone(),
            fetch,
            transform,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));

        let (train_fetcher, train_processor) = if test_config.enable_train_locations {
            let fetcher = TrainLocationFetcher::new(
                config.train_locations.clone(),
                Arc::clone(&train_api) as Arc<dyn TrainPositionsApi>,
                Arc::clone(&object_store),
            );
            let processor = TrainLocationProcessor::new(
                Arc::clone(&object_store),
                config.train_locations.raw_prefix.clone(),
                config.storage.derived_prefix.clone(),
            );
            (Some(Arc::new(fetcher)), Some(Arc::new(processor)))
        } else {
            (None, None)
        };

        let state = Arc::new(AppState::new(
            config,
            orchestrator,
            train_fetcher,
            train_processor,
        ));

        Self {
            router: create_router(state),
            source,
            fetch_task,
            notifier,
            train_api,
            store,
            params,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request, with a JSON body unless `body` is null.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = (!body.is_null()).then(|| body.to_string());
        self.request("POST", path, body).await
    }

    /// Send a POST request with a raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.to_string())).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<String>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(body) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Wire the train location fetcher and processor
    pub enable_train_locations: bool,
    /// Replace the GTFS tasks with mocks whose fetch takes this long
    pub slow_fetch_ms: Option<u64>,
}

impl TestConfig {
    /// Create config with train location ingestion enabled.
    pub fn with_train_locations() -> Self {
        Self {
            enable_train_locations: true,
            ..Default::default()
        }
    }

    /// Create config whose pipeline runs take `delay_ms`.
    pub fn with_slow_fetch(delay_ms: u64) -> Self {
        Self {
            slow_fetch_ms: Some(delay_ms),
            ..Default::default()
        }
    }
}
