pub mod health;
pub mod media;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /health                  liveness (also mounted at the root)
/// /generate                submit a generation job
/// /status/{job_id}         job status projection
/// /jobs                    list jobs
/// /jobs/{job_id}           full job record
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(media::router())
}
