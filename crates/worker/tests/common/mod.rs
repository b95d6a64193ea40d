#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mediagen_core::job::{Job, JobStatus, NewJob};
use mediagen_core::types::{JobId, Parameters, Timestamp};
use mediagen_db::models::job::JobListQuery;
use mediagen_db::{InMemoryJobStore, JobStore, StoreError};
use mediagen_provider::{GenerationProvider, Prediction, PredictionStatus, ProviderError};
use mediagen_storage::{BlobStore, BlobStoreError, MemoryBlobStore, StoredArtifact};
use mediagen_worker::{ExecutionEngine, WorkerConfig};
use tokio::sync::Mutex;

/// How the scripted provider answers every request.
#[derive(Debug, Clone)]
pub enum Script {
    /// Succeed on the first poll with these output URLs.
    Succeed(Vec<String>),
    /// Report `failed` with this error.
    Fail(Option<String>),
    /// Stay `processing` forever.
    NeverFinish,
    /// Reject the create call with an HTTP error.
    RejectCreate,
    /// Report `canceled` with this error.
    Cancel(Option<String>),
    /// Succeed, but the output URL cannot be downloaded.
    FailDownload,
}

/// Provider double that records calls and tracks create concurrency.
pub struct ScriptedProvider {
    script: Script,
    create_delay: Duration,
    creates: AtomicUsize,
    polls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    received: Mutex<Vec<Parameters>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            create_delay: Duration::ZERO,
            creates: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Hold each create call open for `delay`.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub async fn received_parameters(&self) -> Vec<Parameters> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn create(&self, _prompt: &str, parameters: &Parameters) -> Result<String, ProviderError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.received.lock().await.push(parameters.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script {
            Script::RejectCreate => Err(ProviderError::Api {
                status: 503,
                body: "service unavailable".into(),
            }),
            _ => Ok(format!("pred-{n}")),
        }
    }

    async fn poll(&self, external_ref: &str) -> Result<Prediction, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let (status, output, error) = match &self.script {
            Script::Succeed(output) => (PredictionStatus::Succeeded, output.clone(), None),
            Script::Fail(error) => (
                PredictionStatus::Failed,
                Vec::new(),
                error.clone().map(serde_json::Value::String),
            ),
            Script::Cancel(error) => (
                PredictionStatus::Canceled,
                Vec::new(),
                error.clone().map(serde_json::Value::String),
            ),
            Script::FailDownload => (
                PredictionStatus::Succeeded,
                vec!["https://cdn.example/gone.png".to_string()],
                None,
            ),
            Script::NeverFinish | Script::RejectCreate => {
                (PredictionStatus::Processing, Vec::new(), None)
            }
        };
        Ok(Prediction {
            id: external_ref.to_string(),
            status,
            output,
            error,
        })
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        match self.script {
            Script::FailDownload => Err(ProviderError::Api {
                status: 404,
                body: "output expired".into(),
            }),
            _ => Ok(b"generated".to_vec()),
        }
    }
}

/// Artifact store whose backend is always down.
pub struct UnavailableBlobStore;

#[async_trait]
impl BlobStore for UnavailableBlobStore {
    async fn put(
        &self,
        _bytes: &[u8],
        _job_id: JobId,
        _extension: &str,
    ) -> Result<StoredArtifact, BlobStoreError> {
        Err(BlobStoreError::Backend("bucket unavailable".into()))
    }

    async fn delete(&self, _locator: &str) -> bool {
        false
    }
}

/// Job store that refuses to persist a `Completed` job.
pub struct RejectCompletionStore {
    pub inner: InMemoryJobStore,
}

#[async_trait]
impl JobStore for RejectCompletionStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        self.inner.insert(job).await
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        if job.status == JobStatus::Completed {
            return Err(StoreError::Corrupt("write rejected".into()));
        }
        self.inner.update(job).await
    }

    async fn set_external_ref(
        &self,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner.set_external_ref(id, external_ref, now).await
    }

    async fn list_by_statuses(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError> {
        self.inner.list_by_statuses(statuses).await
    }

    async fn list_retryable(&self) -> Result<Vec<Job>, StoreError> {
        self.inner.list_retryable().await
    }

    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, StoreError> {
        self.inner.list(query).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Job store that rejects the listed update calls (1-based).
pub struct FlakyUpdateStore {
    pub inner: InMemoryJobStore,
    rejected: Vec<usize>,
    updates: AtomicUsize,
}

impl FlakyUpdateStore {
    pub fn rejecting(rejected: &[usize]) -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            rejected: rejected.to_vec(),
            updates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobStore for FlakyUpdateStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        self.inner.insert(job).await
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.rejected.contains(&call) {
            return Err(StoreError::Corrupt("connection reset".into()));
        }
        self.inner.update(job).await
    }

    async fn set_external_ref(
        &self,
        id: JobId,
        external_ref: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner.set_external_ref(id, external_ref, now).await
    }

    async fn list_by_statuses(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError> {
        self.inner.list_by_statuses(statuses).await
    }

    async fn list_retryable(&self) -> Result<Vec<Job>, StoreError> {
        self.inner.list_retryable().await
    }

    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, StoreError> {
        self.inner.list(query).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Worker settings with the production defaults.
pub fn test_config() -> WorkerConfig {
    WorkerConfig::default()
}

/// Create and insert a pending job.
pub async fn insert_job(
    store: &dyn JobStore,
    parameters: Option<serde_json::Value>,
    max_retries: Option<i32>,
) -> Job {
    let input = NewJob {
        prompt: "a lighthouse at dusk".into(),
        parameters: parameters.and_then(|p| p.as_object().cloned()),
        max_retries,
    };
    let job = Job::create(input, 3, Utc::now()).unwrap();
    store.insert(&job).await.unwrap();
    job
}

pub struct Harness {
    pub store: Arc<InMemoryJobStore>,
    pub provider: Arc<ScriptedProvider>,
    pub blobs: Arc<MemoryBlobStore>,
    pub engine: Arc<ExecutionEngine>,
}

pub fn harness(provider: ScriptedProvider) -> Harness {
    let store = Arc::new(InMemoryJobStore::new());
    let provider = Arc::new(provider);
    let blobs = Arc::new(MemoryBlobStore::new());
    let engine = Arc::new(ExecutionEngine::new(
        store.clone(),
        provider.clone(),
        blobs.clone(),
        &test_config(),
    ));
    Harness {
        store,
        provider,
        blobs,
        engine,
    }
}

/// Wait (in paused test time) until the job reaches a terminal state.
pub async fn wait_for_terminal(store: &dyn JobStore, id: JobId) -> Job {
    for _ in 0..10_000 {
        let job = store.find_by_id(id).await.unwrap().unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("job {id} never reached a terminal state");
}
