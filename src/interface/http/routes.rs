use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::application::TelemetryService;

use super::handlers::{dashboard_handler, disks_handler, health_handler, stats_handler, AppState};

pub fn create_router(telemetry: Arc<TelemetryService>) -> Router {
    let state = AppState { telemetry };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/disks", get(disks_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
