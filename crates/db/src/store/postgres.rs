use async_trait::async_trait;
use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};

use super::{JobStore, StoreError};
use crate::models::job::{JobListQuery, JobRow};
use crate::repositories::JobRepo;
use crate::DbPool;

/// PostgreSQL-backed [`JobStore`].
#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn into_jobs(rows: Vec<JobRow>) -> Result<Vec<Job>, StoreError> {
    rows.into_iter().map(Job::try_from).collect()
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        JobRepo::insert(&self.pool, job).await.map_err(|e| match e {
            // PostgreSQL unique violation on the primary key.
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(job.id)
            }
            other => StoreError::Database(other),
        })
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        JobRepo::find_by_id(&self.pool, id)
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        if !JobRepo::update(&self.pool, job).await? {
            return Err(StoreError::NotFound(job.id));
        }
        Ok(())
    }

    async fn set_external_ref(
        &self,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        if !JobRepo::set_external_ref(&self.pool, id, external_ref, now).await? {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_by_statuses(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError> {
        into_jobs(JobRepo::list_by_statuses(&self.pool, statuses).await?)
    }

    async fn list_retryable(&self) -> Result<Vec<Job>, StoreError> {
        into_jobs(JobRepo::list_retryable(&self.pool).await?)
    }

    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, StoreError> {
        into_jobs(JobRepo::list(&self.pool, query).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
