//! The job record store interface.
//!
//! The store is the single source of truth for job state. It holds no
//! logic beyond CRUD and filtered queries: every status decision is made
//! by the lifecycle methods on [`Job`] before a record is written back.

mod memory;
mod postgres;

use async_trait::async_trait;
use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};

use crate::models::job::JobListQuery;

pub use memory::InMemoryJobStore;
pub use postgres::PgJobStore;

/// Errors raised by a [`JobStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write targeted a job that does not exist.
    #[error("Job {0} does not exist")]
    NotFound(JobId),

    /// A job with the same id already exists.
    #[error("Job {0} already exists")]
    Duplicate(JobId),

    /// A stored row could not be mapped back into a [`Job`].
    #[error("Corrupt job record: {0}")]
    Corrupt(String),
}

/// Durable keyed storage for job records.
///
/// Implementations must be safe to share across workers; concurrent
/// callers always touch disjoint job ids.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails with [`StoreError::Duplicate`] on id reuse.
    async fn insert(&self, job: &Job) -> Result<(), StoreError>;

    /// Load a job by id.
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    /// Write back a mutated job. The caller owns `updated_at`.
    async fn update(&self, job: &Job) -> Result<(), StoreError>;

    /// Persist the provider handle of a running attempt.
    async fn set_external_ref(
        &self,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// Jobs currently in any of `statuses`, oldest first.
    async fn list_by_statuses(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError>;

    /// Transiently failed jobs with retries left, oldest first.
    async fn list_retryable(&self) -> Result<Vec<Job>, StoreError>;

    /// Paginated listing, newest first.
    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, StoreError>;

    /// Check the backing storage is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
