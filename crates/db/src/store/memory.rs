use std::collections::HashMap;

use async_trait::async_trait;
use mediagen_core::job::{Job, JobStatus};
use mediagen_core::types::{JobId, Timestamp};
use tokio::sync::RwLock;

use super::{JobStore, StoreError};
use crate::models::job::JobListQuery;

/// In-process [`JobStore`] for tests and database-less local runs.
///
/// Records live only as long as the process.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn filtered(&self, keep: impl Fn(&Job) -> bool) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| keep(*job))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs.get_mut(&job.id).ok_or(StoreError::NotFound(job.id))?;
        // Immutable columns keep their stored values.
        *stored = Job {
            prompt: stored.prompt.clone(),
            parameters: stored.parameters.clone(),
            max_retries: stored.max_retries,
            created_at: stored.created_at,
            ..job.clone()
        };
        Ok(())
    }

    async fn set_external_ref(
        &self,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        stored.external_ref = Some(external_ref.to_string());
        stored.updated_at = now;
        Ok(())
    }

    async fn list_by_statuses(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError> {
        Ok(self.filtered(|job| statuses.contains(&job.status)).await)
    }

    async fn list_retryable(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.filtered(Job::can_retry).await)
    }

    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, StoreError> {
        let (limit, offset) = query.page();
        let mut jobs = self
            .filtered(|job| query.status.map_or(true, |status| job.status == status))
            .await;
        jobs.reverse();
        Ok(jobs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
