//! Single-attempt job execution.
//!
//! One call to [`ExecutionEngine::execute`] loads a job, moves it to
//! `Processing`, drives the provider request to a terminal status, stores
//! the artifact and completes the job. Every error raised along the way is
//! converted into a failure mutation on the job record. When that record
//! cannot be read or written the attempt is reported as
//! [`ExecutionOutcome::Deferred`] so the job runs again later; only a
//! missing job surfaces as an [`ExecutionError`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediagen_core::job::Job;
use mediagen_core::lifecycle::{FailureResolution, LifecycleError};
use mediagen_core::params::provider_parameters;
use mediagen_core::retry::RetryPolicy;
use mediagen_core::types::JobId;
use mediagen_db::{JobStore, StoreError};
use mediagen_provider::output::file_extension;
use mediagen_provider::{GenerationProvider, Prediction, PredictionStatus, ProviderError};
use mediagen_storage::{BlobStore, BlobStoreError};
use tokio::time::Instant;

use crate::config::WorkerConfig;

/// Message recorded when the provider fails without saying why.
const UNKNOWN_PROVIDER_ERROR: &str = "Unknown error from provider";

/// Why an attempt (or the bookkeeping around it) failed.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Job store error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Provider request failed: {0}")]
    Provider(#[from] ProviderError),

    /// The provider reported a failed, canceled or unusable generation.
    #[error("{0}")]
    ProviderFailed(String),

    #[error("Generation timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Artifact storage failed: {0}")]
    Storage(#[from] BlobStoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// How a call to [`ExecutionEngine::execute`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The job is `Completed`.
    Completed { result_url: String },
    /// The attempt failed and the job is `Retrying`; re-enqueue it after
    /// `delay`.
    RetryScheduled { delay: Duration, retry_count: i32 },
    /// The attempt failed and the retry ceiling is reached.
    Failed { error: String },
    /// The job was already terminal; nothing was done.
    Skipped,
    /// The job store could not be read or written, so the attempt's result
    /// was not recorded. Run the job again after `delay`.
    Deferred { delay: Duration },
}

/// Runs job attempts against the provider and the artifact store.
pub struct ExecutionEngine {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn GenerationProvider>,
    blobs: Arc<dyn BlobStore>,
    poll_interval: Duration,
    max_wait: Duration,
    retry_policy: RetryPolicy,
}

impl ExecutionEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn GenerationProvider>,
        blobs: Arc<dyn BlobStore>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            blobs,
            poll_interval: config.poll_interval,
            max_wait: config.max_wait,
            retry_policy: config.retry_policy(),
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Run one attempt of `job_id` to conclusion.
    ///
    /// Returns `Err` only when the job does not exist; all attempt errors
    /// become job state.
    pub async fn execute(&self, job_id: JobId) -> Result<ExecutionOutcome, ExecutionError> {
        let loaded = match self.store.find_by_id(job_id).await {
            Ok(loaded) => loaded,
            Err(e) => return Ok(self.defer(job_id, 0, &e)),
        };
        let Some(mut job) = loaded else {
            tracing::warn!(job_id = %job_id, "Job not found, skipping execution");
            return Err(ExecutionError::NotFound(job_id));
        };

        let start = match job.begin_attempt(Utc::now()) {
            Ok(start) => start,
            Err(e) => {
                tracing::info!(job_id = %job_id, status = %job.status, error = %e, "Job not runnable, skipping");
                return Ok(ExecutionOutcome::Skipped);
            }
        };

        tracing::info!(
            job_id = %job_id,
            attempt = job.retry_count + 1,
            max_retries = job.max_retries,
            start = ?start,
            "Executing job",
        );

        match self.run_attempt(&mut job).await {
            Ok(result_url) => {
                tracing::info!(job_id = %job_id, %result_url, "Job completed");
                Ok(ExecutionOutcome::Completed { result_url })
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Job attempt failed");
                match self.handle_failure(job_id, &e.to_string()).await {
                    Err(ExecutionError::Persistence(store_error)) => {
                        Ok(self.defer(job_id, job.retry_count, &store_error))
                    }
                    other => other,
                }
            }
        }
    }

    /// The store failed around an attempt; the job keeps its stored state
    /// and is run again after the backoff for `retry_count`.
    fn defer(&self, job_id: JobId, retry_count: i32, error: &StoreError) -> ExecutionOutcome {
        let delay = self.retry_policy.delay_for(retry_count);
        tracing::error!(
            job_id = %job_id,
            error = %error,
            delay_secs = delay.as_secs(),
            "Job state not recorded, deferring",
        );
        ExecutionOutcome::Deferred { delay }
    }

    /// Steps between entering `Processing` and completing the job.
    async fn run_attempt(&self, job: &mut Job) -> Result<String, ExecutionError> {
        // Persisted before the provider call; for a resumed job this only
        // refreshes `updated_at`.
        self.store.update(job).await?;

        let external_ref = match job.external_ref.clone() {
            Some(external_ref) => {
                tracing::info!(job_id = %job.id, %external_ref, "Resuming provider request");
                external_ref
            }
            None => {
                let parameters = provider_parameters(&job.parameters);
                let external_ref = self.provider.create(&job.prompt, &parameters).await?;
                let now = Utc::now();
                job.record_external_ref(external_ref.clone(), now)?;
                self.store.set_external_ref(job.id, &external_ref, now).await?;
                tracing::debug!(job_id = %job.id, %external_ref, "Provider request started");
                external_ref
            }
        };

        let prediction = self.wait_for_completion(&external_ref).await?;
        let output_url = successful_output(&prediction)?;

        let bytes = self.provider.download(output_url).await?;
        let extension = file_extension(output_url);
        let artifact = self.blobs.put(&bytes, job.id, &extension).await?;

        job.complete(artifact.public_url.clone(), artifact.locator.clone(), Utc::now())?;
        if let Err(e) = self.store.update(job).await {
            // The record never pointed at the artifact; do not leave it behind.
            if !self.blobs.delete(&artifact.locator).await {
                tracing::warn!(job_id = %job.id, locator = %artifact.locator, "Orphaned artifact not removed");
            }
            return Err(e.into());
        }

        Ok(artifact.public_url)
    }

    /// Poll until the provider reports a terminal status or the budget runs out.
    async fn wait_for_completion(&self, external_ref: &str) -> Result<Prediction, ExecutionError> {
        let started = Instant::now();
        loop {
            let prediction = self.provider.poll(external_ref).await?;
            if prediction.status.is_terminal() {
                return Ok(prediction);
            }
            if started.elapsed() > self.max_wait {
                return Err(ExecutionError::Timeout(self.max_wait));
            }
            tracing::debug!(%external_ref, status = ?prediction.status, "Waiting for provider");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Record a failed attempt and resolve it into a retry or a terminal failure.
    ///
    /// Re-reads the job so the failure applies to the stored state. A job
    /// that is already terminal is left untouched.
    async fn handle_failure(
        &self,
        job_id: JobId,
        message: &str,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let mut job = self
            .store
            .find_by_id(job_id)
            .await?
            .ok_or(ExecutionError::NotFound(job_id))?;

        let resolution = match job.record_failure(message, Utc::now()) {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::debug!(job_id = %job_id, error = %e, "Job already terminal, failure ignored");
                return Ok(ExecutionOutcome::Skipped);
            }
        };
        self.store.update(&job).await?;

        match resolution {
            FailureResolution::Retry {
                previous_retry_count,
            } => {
                let delay = self.retry_policy.delay_for(previous_retry_count);
                tracing::info!(
                    job_id = %job_id,
                    retry_count = job.retry_count,
                    max_retries = job.max_retries,
                    delay_secs = delay.as_secs(),
                    "Job scheduled for retry",
                );
                Ok(ExecutionOutcome::RetryScheduled {
                    delay,
                    retry_count: job.retry_count,
                })
            }
            FailureResolution::Terminal => {
                tracing::error!(
                    job_id = %job_id,
                    retry_count = job.retry_count,
                    error = %message,
                    "Job failed permanently",
                );
                Ok(ExecutionOutcome::Failed {
                    error: message.to_string(),
                })
            }
        }
    }
}

/// First output reference of a terminal prediction, or why there is none.
fn successful_output(prediction: &Prediction) -> Result<&str, ExecutionError> {
    match prediction.status {
        PredictionStatus::Succeeded => prediction
            .output
            .first()
            .map(String::as_str)
            .ok_or_else(|| {
                ExecutionError::ProviderFailed("Generation succeeded without any output".into())
            }),
        PredictionStatus::Canceled => Err(ExecutionError::ProviderFailed(
            prediction
                .error_message()
                .unwrap_or_else(|| "Generation was canceled by the provider".into()),
        )),
        _ => Err(ExecutionError::ProviderFailed(
            prediction
                .error_message()
                .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.into()),
        )),
    }
}
