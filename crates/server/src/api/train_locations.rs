//! Train location ingestion API handlers.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use cta_pipeline_core::previous_utc_day;
use cta_pipeline_core::train_locations::{ProcessSummary, TrainFetchSummary};

use super::handlers::ErrorResponse;
use crate::state::AppState;

const DISABLED: &str = "Train location ingestion is disabled. Set train_locations.enabled = true.";

/// Body of a process request. An empty body processes the previous UTC day.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Take one sample of every configured line.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrainFetchSummary>, (StatusCode, Json<ErrorResponse>)> {
    let fetcher = state
        .train_fetcher()
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::SERVICE_UNAVAILABLE, DISABLED))?;

    fetcher.fetch().await.map(Json).map_err(|e| {
        error!(error = %e, "Manual train location fetch failed");
        ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Flatten one day of samples into CSV.
pub async fn process(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ProcessSummary>, (StatusCode, Json<ErrorResponse>)> {
    let processor = state
        .train_processor()
        .ok_or_else(|| ErrorResponse::with_status(StatusCode::SERVICE_UNAVAILABLE, DISABLED))?;

    let request = parse_process_request(&body).map_err(|e| {
        ErrorResponse::with_status(StatusCode::BAD_REQUEST, format!("Invalid request: {}", e))
    })?;
    let date = request.date.unwrap_or_else(|| previous_utc_day(Utc::now()));
    info!(date = %date, "Manual train location processing requested");

    processor.process_date(date).await.map(Json).map_err(|e| {
        error!(date = %date, error = %e, "Manual train location processing failed");
        ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

fn parse_process_request(body: &[u8]) -> Result<ProcessRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProcessRequest::default());
    }
    serde_json::from_slice(body)
}
