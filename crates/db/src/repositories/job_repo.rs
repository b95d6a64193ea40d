//! Repository for the `jobs` table.
//!
//! Status values are bound through `JobStatus::id()`; no magic numbers.

use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};
use sqlx::PgPool;

use crate::models::job::{JobListQuery, JobRow};
use crate::models::status::status_ids;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, prompt, parameters, status_id, \
    created_at, updated_at, started_at, completed_at, \
    result_url, storage_locator, \
    retry_count, max_retries, error_message, external_ref";

/// Provides CRUD and filtered queries for job records.
pub struct JobRepo;

impl JobRepo {
    /// Insert a freshly created job.
    pub async fn insert(pool: &PgPool, job: &Job) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO jobs \
                 (id, prompt, parameters, status_id, created_at, updated_at, \
                  started_at, completed_at, result_url, storage_locator, \
                  retry_count, max_retries, error_message, external_ref) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(job.id)
        .bind(&job.prompt)
        .bind(serde_json::Value::Object(job.parameters.clone()))
        .bind(job.status.id())
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.result_url)
        .bind(&job.storage_locator)
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(&job.error_message)
        .bind(&job.external_ref)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: JobId) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write every mutable column of `job`.
    ///
    /// `prompt`, `parameters`, `max_retries` and `created_at` are immutable
    /// and never rewritten. Returns `false` if no row matched.
    pub async fn update(pool: &PgPool, job: &Job) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, updated_at = $3, started_at = $4, completed_at = $5, \
                 result_url = $6, storage_locator = $7, retry_count = $8, \
                 error_message = $9, external_ref = $10 \
             WHERE id = $1",
        )
        .bind(job.id)
        .bind(job.status.id())
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.result_url)
        .bind(&job.storage_locator)
        .bind(job.retry_count)
        .bind(&job.error_message)
        .bind(&job.external_ref)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist the provider handle of a running attempt.
    pub async fn set_external_ref(
        pool: &PgPool,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET external_ref = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(external_ref)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All jobs whose status is one of `statuses`, oldest first.
    pub async fn list_by_statuses(
        pool: &PgPool,
        statuses: &[JobStatus],
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs WHERE status_id = ANY($1) ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(status_ids(statuses))
            .fetch_all(pool)
            .await
    }

    /// Transiently failed jobs that still have retries left.
    pub async fn list_retryable(pool: &PgPool) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status_id = $1 AND retry_count < max_retries \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Failed.id())
            .fetch_all(pool)
            .await
    }

    /// List jobs newest first with optional status filter and pagination.
    pub async fn list(pool: &PgPool, params: &JobListQuery) -> Result<Vec<JobRow>, sqlx::Error> {
        let (limit, offset) = params.page();

        let query = match params.status {
            Some(_) => format!(
                "SELECT {COLUMNS} FROM jobs WHERE status_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            ),
            None => format!(
                "SELECT {COLUMNS} FROM jobs ORDER BY created_at DESC LIMIT $1 OFFSET $2"
            ),
        };

        let mut q = sqlx::query_as::<_, JobRow>(&query);
        if let Some(status) = params.status {
            q = q.bind(status.id());
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }
}
