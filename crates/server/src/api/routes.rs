use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, pipeline, train_locations};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // GTFS pipeline
        .route("/pipeline/status", get(pipeline::get_status))
        .route("/pipeline/runs", post(pipeline::trigger_run))
        // Train locations
        .route("/train-locations/fetch", post(train_locations::fetch))
        .route("/train-locations/process", post(train_locations::process));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(metrics_middleware)),
        )
        .with_state(state)
}
