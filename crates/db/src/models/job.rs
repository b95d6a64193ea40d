//! Row mapping for the `jobs` table.

use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

use super::status::StatusId;
use crate::store::StoreError;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: JobId,
    pub prompt: String,
    pub parameters: serde_json::Value,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub result_url: Option<String>,
    pub storage_locator: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_message: Option<String>,
    pub external_ref: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_id(row.status_id).ok_or_else(|| {
            StoreError::Corrupt(format!("job {} has unknown status_id {}", row.id, row.status_id))
        })?;
        let parameters = match row.parameters {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => Default::default(),
            other => {
                return Err(StoreError::Corrupt(format!(
                    "job {} parameters are not an object: {other}",
                    row.id
                )))
            }
        };

        Ok(Job {
            id: row.id,
            prompt: row.prompt,
            parameters,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            result_url: row.result_url,
            storage_locator: row.storage_locator,
            retry_count: row.retry_count,
            max_retries: row.max_retries,
            error_message: row.error_message,
            external_ref: row.external_ref,
        })
    }
}

/// Query parameters for listing jobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by status (lowercase name, e.g. `failed`).
    pub status: Option<JobStatus>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
pub const DEFAULT_LIMIT: i64 = 50;

impl JobListQuery {
    /// Effective `(limit, offset)` after defaults and clamping.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
