//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline runs (outcomes, duration, skipped triggers)
//! - Tasks and notifications
//! - Train location ingestion

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator
// =============================================================================

/// Pipeline runs by terminal outcome.
pub static PIPELINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cta_pipeline_runs_total", "Total pipeline runs"),
        &["outcome"], // "transformed", "no_new_data", "failed"
    )
    .unwrap()
});

/// Pipeline run duration in seconds.
pub static PIPELINE_RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cta_pipeline_run_duration_seconds",
            "Duration of a pipeline run",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Triggers rejected because a run was already in progress.
pub static PIPELINE_RUNS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cta_pipeline_runs_skipped_total",
        "Pipeline triggers skipped because a run was in progress",
    )
    .unwrap()
});

/// Task failures by task name.
pub static TASK_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cta_task_failures_total", "Total task failures"),
        &["task"],
    )
    .unwrap()
});

/// Failure notifications by delivery result.
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cta_notifications_total", "Total failure notifications"),
        &["result"], // "delivered", "failed"
    )
    .unwrap()
});

// =============================================================================
// GTFS tasks
// =============================================================================

/// Raw GTFS files written to object storage.
pub static RAW_FILES_STORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cta_gtfs_raw_files_stored_total",
        "Raw GTFS files written to object storage",
    )
    .unwrap()
});

/// Expected schedule rows written.
pub static SCHEDULE_ROWS_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cta_expected_schedule_rows_total",
        "Expected schedule rows written",
    )
    .unwrap()
});

// =============================================================================
// Train locations
// =============================================================================

/// Per-line Train Tracker requests by result.
pub static TRAIN_LOCATION_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cta_train_location_fetches_total",
            "Train Tracker requests per line",
        ),
        &["line", "result"], // result: "success", "retry", "failed"
    )
    .unwrap()
});

/// Train location records written by the daily processor.
pub static TRAIN_LOCATION_RECORDS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cta_train_location_records_total",
        "Flattened train location records written",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(PIPELINE_RUNS.clone()),
        Box::new(PIPELINE_RUN_DURATION.clone()),
        Box::new(PIPELINE_RUNS_SKIPPED.clone()),
        Box::new(TASK_FAILURES.clone()),
        Box::new(NOTIFICATIONS.clone()),
        // GTFS
        Box::new(RAW_FILES_STORED.clone()),
        Box::new(SCHEDULE_ROWS_WRITTEN.clone()),
        // Train locations
        Box::new(TRAIN_LOCATION_FETCHES.clone()),
        Box::new(TRAIN_LOCATION_RECORDS.clone()),
    ]
}
