//! Shared response types for API handlers.
//!
//! Collection endpoints use a `{ "data": ... }` envelope via
//! [`DataResponse`]. The generate and status endpoints return flat
//! payloads that clients poll directly.

use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body of a successful `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub retry_count: i32,
}

impl From<Job> for StatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            result_url: job.result_url,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
            retry_count: job.retry_count,
        }
    }
}
