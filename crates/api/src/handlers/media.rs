//! Handlers for media generation jobs.
//!
//! Submitting a job only validates, persists and enqueues it; execution
//! happens in the worker pool and its outcome is observed by polling.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use mediagen_core::error::CoreError;
use mediagen_core::job::{Job, NewJob};
use mediagen_core::types::JobId;
use mediagen_db::models::job::JobListQuery;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, GenerateResponse, StatusResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a job id path segment. A malformed id is a validation error.
fn parse_job_id(raw: &str) -> AppResult<JobId> {
    JobId::parse_str(raw)
        .map_err(|_| AppError::Core(CoreError::Validation(format!("Invalid job id '{raw}'"))))
}

/// Fetch a job by ID or fail with `NotFound`.
async fn find_job(state: &AppState, job_id: JobId) -> AppResult<Job> {
    state
        .store
        .find_by_id(job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/generate
///
/// Create a job and hand it to the dispatcher. Returns 201 with the job id;
/// the job starts in `pending` status.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<NewJob>,
) -> AppResult<impl IntoResponse> {
    let job = Job::create(input, state.config.default_max_retries, Utc::now())?;
    state.store.insert(&job).await?;

    tracing::info!(
        job_id = %job.id,
        max_retries = job.max_retries,
        "Generation job created",
    );

    if !state.dispatcher.enqueue(job.id).await {
        // Stays pending; the next startup recovery picks it up.
        tracing::warn!(job_id = %job.id, "Job accepted but not enqueued");
    }

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            job_id: job.id,
            status: job.status,
            message: "Media generation job created successfully".to_string(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/status/{job_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = find_job(&state, parse_job_id(&job_id)?).await?;
    Ok(Json(StatusResponse::from(job)))
}

/// GET /api/v1/jobs/{job_id}
///
/// The full job record.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = find_job(&state, parse_job_id(&job_id)?).await?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs
///
/// Newest first. Supports optional `status`, `limit` and `offset` query
/// parameters.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = state.store.list(&params).await?;
    Ok(Json(DataResponse { data: jobs }))
}
