//! Orchestrator lifecycle integration tests.
//!
//! These tests drive complete runs through the real GTFS tasks, a filesystem
//! object store and a SQLite checkpoint:
//! RunFetch -> Decide -> {RunTransform | Done}, with NotifyFailure on error

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use cta_pipeline_core::{
    checkpoint::{CheckpointStore, ParameterStore, SqliteParameterStore},
    fetcher::FeedSource,
    notifier::Notifier,
    orchestrator::{StateKind, TaskStage},
    storage::{FsObjectStore, ObjectStore},
    testing::{fixtures, MockFeedSource, MockNotifier},
    ExpectedScheduleTask, FetchTask, GtfsFetchTask, OrchestratorConfig, PipelineOrchestrator,
    RunOutcome, TransformTask,
};

const PARAM: &str = "gtfs_last_modified_time";
const RAW_KEY: &str = "gtfs_data/version=20260223T150000Z/stops.txt";
const DERIVED_KEY: &str = "derived/gtfs_expected_cta_schedule.csv";

/// Test helper wiring real tasks around a mock feed and notifier.
struct TestHarness {
    source: Arc<MockFeedSource>,
    store: Arc<FsObjectStore>,
    params: Arc<SqliteParameterStore>,
    notifier: Arc<MockNotifier>,
    orchestrator: Arc<PipelineOrchestrator>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new(source: MockFeedSource) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(FsObjectStore::new(temp_dir.path().join("objects")));
        let params = Arc::new(
            SqliteParameterStore::new(&temp_dir.path().join("params.db"))
                .expect("Failed to create parameter store"),
        );
        let source = Arc::new(source);
        let notifier = Arc::new(MockNotifier::new());

        let checkpoints = CheckpointStore::new(Arc::clone(&params) as Arc<dyn ParameterStore>, PARAM);
        let fetch = GtfsFetchTask::new(
            Arc::clone(&source) as Arc<dyn FeedSource>,
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            checkpoints,
            "gtfs_data/",
        );
        let transform =
            ExpectedScheduleTask::new(Arc::clone(&store) as Arc<dyn ObjectStore>, "derived/");

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(fetch) as Arc<dyn FetchTask>,
            Arc::new(transform) as Arc<dyn TransformTask>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));

        Self {
            source,
            store,
            params,
            notifier,
            orchestrator,
            _temp_dir: temp_dir,
        }
    }

    fn checkpoint(&self) -> Option<String> {
        self.params.get_parameter(PARAM).unwrap()
    }

    async fn object_count(&self) -> usize {
        self.store.list("").await.unwrap().len()
    }
}

/// New upstream data: fetch, store, advance checkpoint, transform, no notification.
#[tokio::test]
async fn test_new_data_runs_full_pipeline() {
    let h = TestHarness::new(MockFeedSource::with_feed(
        fixtures::GTFS_LAST_MODIFIED,
        fixtures::gtfs_zip(),
    ));
    h.params.put_parameter(PARAM, "2026-01-15T00:00:00").unwrap();

    let report = h.orchestrator.trigger().await.unwrap();

    assert_eq!(
        report.states,
        vec![StateKind::RunFetch, StateKind::Decide, StateKind::RunTransform]
    );
    match &report.outcome {
        RunOutcome::Transformed { derived } => {
            assert_eq!(derived.key, DERIVED_KEY);
            assert_eq!(derived.rows, 3);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert!(h.store.exists(RAW_KEY).await.unwrap());
    assert!(h.store.exists(DERIVED_KEY).await.unwrap());
    assert_eq!(h.checkpoint().as_deref(), Some("2026-02-23T15:00:00"));
    assert_eq!(h.notifier.publish_count().await, 0);
}

/// A caller that stops waiting does not strand the run between checkpoint
/// advance and transform.
#[tokio::test]
async fn test_abandoned_trigger_still_writes_derived_output() {
    let h = TestHarness::new(MockFeedSource::with_feed(
        fixtures::GTFS_LAST_MODIFIED,
        fixtures::gtfs_zip(),
    ));

    let waited = tokio::time::timeout(Duration::ZERO, h.orchestrator.trigger()).await;
    assert!(waited.is_err());

    for _ in 0..200 {
        let status = h.orchestrator.status().await;
        if status.last_run.is_some() && !status.running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let status = h.orchestrator.status().await;
    let last_run = status.last_run.expect("abandoned run should still finish");
    assert_eq!(last_run.outcome.label(), "transformed");
    assert_eq!(h.checkpoint().as_deref(), Some("2026-02-23T15:00:00"));
    assert!(h.store.exists(DERIVED_KEY).await.unwrap());

    // The next run sees the advanced checkpoint.
    let next = h.orchestrator.trigger().await.unwrap();
    assert_eq!(next.outcome, RunOutcome::NoNewData);
}

/// Unchanged upstream: no writes, no transform, no notification.
#[tokio::test]
async fn test_unchanged_upstream_ends_in_done() {
    let h = TestHarness::new(MockFeedSource::with_feed(
        fixtures::GTFS_LAST_MODIFIED,
        fixtures::gtfs_zip(),
    ));
    h.params.put_parameter(PARAM, "2026-02-23T15:00:00").unwrap();

    let report = h.orchestrator.trigger().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoNewData);
    assert_eq!(
        report.states,
        vec![StateKind::RunFetch, StateKind::Decide, StateKind::Done]
    );
    assert_eq!(h.object_count().await, 0);
    assert_eq!(h.checkpoint().as_deref(), Some("2026-02-23T15:00:00"));
    assert_eq!(h.notifier.publish_count().await, 0);
}

/// Missing configuration: fetch fails, exactly one notification, transform never runs.
#[tokio::test]
async fn test_fetch_failure_notifies_once() {
    let h = TestHarness::new(MockFeedSource::with_url(""));

    let report = h.orchestrator.trigger().await.unwrap();

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed {
            stage: TaskStage::Fetch,
            notified: true,
            ..
        }
    ));
    assert_eq!(
        report.states,
        vec![StateKind::RunFetch, StateKind::NotifyFailure]
    );
    assert_eq!(h.notifier.publish_count().await, 1);
    assert_eq!(h.object_count().await, 0);
    assert_eq!(h.checkpoint(), None);
    assert_eq!(h.source.download_count().await, 0);
}

/// Back-to-back runs: the second sees the advanced checkpoint and does nothing.
#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let h = TestHarness::new(MockFeedSource::with_feed(
        fixtures::GTFS_LAST_MODIFIED,
        fixtures::gtfs_zip(),
    ));

    let first = h.orchestrator.trigger().await.unwrap();
    assert_eq!(first.outcome.label(), "transformed");
    let objects_after_first = h.object_count().await;

    let second = h.orchestrator.trigger().await.unwrap();
    assert_eq!(second.outcome, RunOutcome::NoNewData);
    assert_eq!(h.object_count().await, objects_after_first);

    let status = h.orchestrator.status().await;
    assert_eq!(status.runs_started, 2);
    assert_eq!(status.last_run, Some(second));
}

/// Missing Last-Modified header is a task failure, even though the body is fine.
#[tokio::test]
async fn test_missing_last_modified_header_fails_run() {
    let h = TestHarness::new(MockFeedSource::new());
    h.source.set_response(None, fixtures::gtfs_zip()).await;

    let report = h.orchestrator.trigger().await.unwrap();

    match &report.outcome {
        RunOutcome::Failed { stage, error, .. } => {
            assert_eq!(*stage, TaskStage::Fetch);
            assert_eq!(error, "Last-Modified header not found in the response");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.notifier.publish_count().await, 1);
}

/// A corrupt feed version fails in transform; the checkpoint has still advanced.
#[tokio::test]
async fn test_transform_failure_after_successful_fetch() {
    let broken = fixtures::zip_with(&[("routes.txt", Some(&b"route_id\nRed\n"[..]))]);
    let h = TestHarness::new(MockFeedSource::with_feed(fixtures::GTFS_LAST_MODIFIED, broken));

    let report = h.orchestrator.trigger().await.unwrap();

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed {
            stage: TaskStage::Transform,
            ..
        }
    ));
    assert_eq!(report.states.len(), 4);
    assert_eq!(h.checkpoint().as_deref(), Some("2026-02-23T15:00:00"));
    assert!(!h.store.exists(DERIVED_KEY).await.unwrap());
    assert_eq!(h.notifier.publish_count().await, 1);
}

/// A notifier outage does not change where the run ends.
#[tokio::test]
async fn test_notifier_failure_is_best_effort() {
    let h = TestHarness::new(MockFeedSource::with_url(""));
    h.notifier.set_fail(true).await;

    let report = h.orchestrator.trigger().await.unwrap();

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed {
            stage: TaskStage::Fetch,
            notified: false,
            ..
        }
    ));
    assert_eq!(h.notifier.publish_count().await, 1);
}
