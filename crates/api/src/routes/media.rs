//! Route definitions for media generation jobs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Job routes, mounted under `/api/v1`.
///
/// ```text
/// POST   /generate             -> generate
/// GET    /status/{job_id}      -> get_status
/// GET    /jobs                 -> list_jobs
/// GET    /jobs/{job_id}        -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(media::generate))
        .route("/status/{job_id}", get(media::get_status))
        .route("/jobs", get(media::list_jobs))
        .route("/jobs/{job_id}", get(media::get_job))
}
