use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

use crate::application::TelemetryService;
use crate::domain::{DiskHealthRecord, SystemStats};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<TelemetryService>,
}

/// Response for /api/disks
#[derive(Debug, Serialize)]
pub struct DisksResponse {
    pub timestamp: String,
    pub disks: Vec<DiskHealthRecord>,
}

/// Response for /api/stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub timestamp: String,
    pub stats: SystemStats,
}

/// Response for /api/dashboard (aggregated)
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub timestamp: String,
    pub disks: Vec<DiskHealthRecord>,
    pub stats: SystemStats,
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "healthmon"
        })),
    )
}

/// Handler for GET /api/disks
pub async fn disks_handler(State(state): State<AppState>) -> Response {
    match state.telemetry.collect_disk_health().await {
        Ok(disks) => (
            StatusCode::OK,
            Json(DisksResponse {
                timestamp: chrono::Utc::now().to_rfc3339(),
                disks,
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Response {
    let stats = state.telemetry.collect_system_stats().await;
    (
        StatusCode::OK,
        Json(StatsResponse {
            timestamp: chrono::Utc::now().to_rfc3339(),
            stats,
        }),
    )
        .into_response()
}

/// Handler for GET /api/dashboard (aggregated endpoint)
pub async fn dashboard_handler(State(state): State<AppState>) -> Response {
    let disks = match state.telemetry.collect_disk_health().await {
        Ok(d) => d,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let stats = state.telemetry.collect_system_stats().await;

    (
        StatusCode::OK,
        Json(DashboardResponse {
            timestamp: chrono::Utc::now().to_rfc3339(),
            disks,
            stats,
        }),
    )
        .into_response()
}
