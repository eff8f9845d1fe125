//! GTFS pipeline API handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

use cta_pipeline_core::{OrchestratorError, OrchestratorStatus, RunReport};

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Get orchestrator status, including the last completed run.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status().await)
}

/// Run the pipeline now and wait for it to finish.
///
/// A failed run still answers 200: the failure is in the report's outcome.
/// A refused start (a run already in progress) is 409. A client that
/// disconnects does not cancel the run.
pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunReport>, (StatusCode, Json<ErrorResponse>)> {
    info!("Manual pipeline run requested");

    match state.orchestrator().trigger().await {
        Ok(report) => Ok(Json(report)),
        Err(e @ OrchestratorError::AlreadyRunning) => Err(ErrorResponse::with_status(
            StatusCode::CONFLICT,
            e.to_string(),
        )),
        Err(e @ OrchestratorError::Aborted(_)) => Err(ErrorResponse::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}
