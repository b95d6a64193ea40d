//! Job dispatcher: bounded concurrency, duplicate guard, delayed retries.
//!
//! Job ids flow through an unbounded in-process queue. A single loop pulls
//! ids off the queue, waits for one of `concurrency` permits and runs the
//! job on its own task. A job id stays in the active set from the moment it
//! is enqueued until its attempt finishes without scheduling a retry, so a
//! second enqueue of a queued, running or retry-waiting job is a no-op.
//!
//! Retry timers are plain sleeping tasks that feed the queue directly; they
//! hold no permit while waiting.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use mediagen_core::types::JobId;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::engine::{ExecutionEngine, ExecutionOutcome};

/// Handle to the running dispatcher. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<ExecutionEngine>,
    sender: mpsc::UnboundedSender<JobId>,
    permits: Arc<Semaphore>,
    /// Queued, running or waiting-for-retry job ids.
    active: Mutex<HashSet<JobId>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Spawn the dispatch loop with `concurrency` worker slots.
    pub fn start(engine: Arc<ExecutionEngine>, concurrency: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            engine,
            sender,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            active: Mutex::new(HashSet::new()),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        });

        tracing::info!(concurrency, "Job dispatcher started");
        inner.tracker.spawn(Arc::clone(&inner).run(receiver));

        Self { inner }
    }

    /// Queue a job for immediate execution.
    ///
    /// Returns `false` when the job is already queued, running or waiting
    /// for a retry, or when the dispatcher is shutting down.
    pub async fn enqueue(&self, job_id: JobId) -> bool {
        if self.inner.cancel.is_cancelled() {
            tracing::warn!(job_id = %job_id, "Dispatcher is shutting down, enqueue ignored");
            return false;
        }

        let mut active = self.inner.active.lock().await;
        if !active.insert(job_id) {
            tracing::info!(job_id = %job_id, "Job already active, duplicate enqueue ignored");
            return false;
        }
        if self.inner.sender.send(job_id).is_err() {
            active.remove(&job_id);
            tracing::error!(job_id = %job_id, "Dispatch queue closed, enqueue dropped");
            return false;
        }

        tracing::debug!(job_id = %job_id, "Job enqueued");
        true
    }

    /// Queue a job for execution no earlier than `delay` from now.
    ///
    /// Same duplicate rules as [`Dispatcher::enqueue`].
    pub async fn schedule_retry(&self, job_id: JobId, delay: Duration) -> bool {
        if self.inner.cancel.is_cancelled() {
            return false;
        }

        if !self.inner.active.lock().await.insert(job_id) {
            tracing::info!(job_id = %job_id, "Job already active, retry schedule ignored");
            return false;
        }
        self.inner.arm_retry(job_id, delay);
        true
    }

    /// Whether `job_id` is queued, running or waiting for a retry.
    pub async fn is_active(&self, job_id: JobId) -> bool {
        self.inner.active.lock().await.contains(&job_id)
    }

    pub async fn active_count(&self) -> usize {
        self.inner.active.lock().await.len()
    }

    /// Stop accepting work and wait up to `timeout` for running attempts.
    ///
    /// Pending retry timers are dropped; their jobs stay `Retrying` in the
    /// store and are picked up by the next startup recovery. Returns
    /// `false` if attempts were still running when the timeout expired.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.inner.cancel.cancel();
        self.inner.tracker.close();

        match tokio::time::timeout(timeout, self.inner.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Job dispatcher drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Job dispatcher shutdown timed out with attempts still running",
                );
                false
            }
        }
    }
}

impl Inner {
    /// Pull job ids and run each under a concurrency permit.
    async fn run(self: Arc<Self>, mut receiver: mpsc::UnboundedReceiver<JobId>) {
        loop {
            let job_id = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = receiver.recv() => match next {
                    Some(job_id) => job_id,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let inner = Arc::clone(&self);
            self.tracker.spawn(async move {
                let retry_delay = inner.run_job(job_id).await;
                drop(permit);
                match retry_delay {
                    Some(delay) => inner.arm_retry(job_id, delay),
                    None => {
                        inner.active.lock().await.remove(&job_id);
                    }
                }
            });
        }

        tracing::info!("Job dispatcher shutting down");
    }

    /// Execute one attempt. Returns the delay before the job must run again,
    /// if any.
    async fn run_job(&self, job_id: JobId) -> Option<Duration> {
        match self.engine.execute(job_id).await {
            Ok(ExecutionOutcome::RetryScheduled { delay, .. })
            | Ok(ExecutionOutcome::Deferred { delay }) => Some(delay),
            Ok(ExecutionOutcome::Completed { .. }) | Ok(ExecutionOutcome::Skipped) => None,
            Ok(ExecutionOutcome::Failed { error }) => {
                tracing::warn!(job_id = %job_id, %error, "Job reached its retry ceiling");
                None
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Job execution aborted");
                None
            }
        }
    }

    /// Re-queue `job_id` after `delay` without holding a worker slot.
    ///
    /// The id must already be in the active set.
    fn arm_retry(&self, job_id: JobId, delay: Duration) {
        let sender = self.sender.clone();
        let cancel = self.cancel.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if sender.send(job_id).is_err() {
                        tracing::warn!(job_id = %job_id, "Dispatch queue closed before retry");
                    } else {
                        tracing::debug!(job_id = %job_id, "Retry re-enqueued");
                    }
                }
            }
        });
    }
}
