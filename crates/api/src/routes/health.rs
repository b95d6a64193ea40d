use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Liveness; always `healthy` when the process answers.
    pub status: &'static str,
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the job store is reachable.
    pub db_healthy: bool,
    /// Jobs queued, running or waiting for a retry in this process.
    pub active_jobs: usize,
}

/// GET /health -- returns service and job store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.store.health_check().await.is_ok();

    Json(HealthResponse {
        status: "healthy",
        service: "media-generation-api",
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        active_jobs: state.dispatcher.active_count().await,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
