//! Prometheus metrics for the server.
//!
//! HTTP request metrics live here; pipeline and ingestion metrics come from
//! `cta_pipeline_core::metrics` and are registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cta_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cta_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cta_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Status
// =============================================================================

/// 1 while a GTFS pipeline run holds the orchestrator lock (collected dynamically).
pub static PIPELINE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cta_pipeline_running",
        "Whether a GTFS pipeline run is in progress",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(PIPELINE_RUNNING.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(cta_pipeline_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Update gauges that mirror current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    PIPELINE_RUNNING.set(i64::from(status.running));
}
