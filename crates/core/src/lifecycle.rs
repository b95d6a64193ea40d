//! Job lifecycle state machine.
//!
//! ```text
//! Pending ──► Processing ──► Completed
//!                 │
//!                 ▼
//!          Failed (transient) ──► Retrying ──► Processing ...
//!                 │
//!                 ▼  retry_count >= max_retries
//!          Failed (terminal)
//! ```
//!
//! `Failed` is transient while `retry_count < max_retries` and terminal
//! afterwards. Nothing ever returns to `Pending`. Every mutating method
//! refreshes `updated_at`; rejected transitions leave the record untouched.

use crate::job::{Job, JobStatus};
use crate::types::Timestamp;

/// A transition the state machine refuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Job is in terminal state '{status}'")]
    Terminal { status: JobStatus },

    #[error("Invalid job transition from '{from}' to '{to}'")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// How an attempt begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStart {
    /// A new provider request must be created.
    Fresh,
    /// The job was already `Processing` (crash-restart); any persisted
    /// external ref may be polled instead of starting over.
    Resume,
}

/// What a recorded failure resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureResolution {
    /// Moved to `Retrying`. `previous_retry_count` is the count before the
    /// increment and drives the backoff delay.
    Retry { previous_retry_count: i32 },
    /// Retry ceiling reached; the job is terminally `Failed`.
    Terminal,
}

impl Job {
    /// `Completed`, or `Failed` with the retry ceiling reached.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            JobStatus::Completed => true,
            JobStatus::Failed => self.retry_count >= self.max_retries,
            _ => false,
        }
    }

    /// Derived predicate: a transient failure with retries left.
    pub fn can_retry(&self) -> bool {
        self.status == JobStatus::Failed && self.retry_count < self.max_retries
    }

    /// Enter `Processing` for a new attempt.
    ///
    /// `Pending` and `Retrying` start fresh. A `Retrying` job drops the
    /// previous attempt's external ref so a crash before the new ref is
    /// persisted cannot resume a dead request. `Processing` is accepted
    /// idempotently and `started_at` is never reset.
    pub fn begin_attempt(&mut self, now: Timestamp) -> Result<AttemptStart, LifecycleError> {
        self.ensure_not_terminal()?;
        match self.status {
            JobStatus::Processing => Ok(AttemptStart::Resume),
            JobStatus::Pending | JobStatus::Retrying => {
                if self.status == JobStatus::Retrying {
                    self.external_ref = None;
                }
                self.status = JobStatus::Processing;
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
                self.updated_at = now;
                Ok(AttemptStart::Fresh)
            }
            from => Err(LifecycleError::InvalidTransition {
                from,
                to: JobStatus::Processing,
            }),
        }
    }

    /// Record the provider handle of the running attempt.
    pub fn record_external_ref(
        &mut self,
        external_ref: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.ensure_processing(JobStatus::Processing)?;
        self.external_ref = Some(external_ref.into());
        self.updated_at = now;
        Ok(())
    }

    /// `Processing` → `Completed` with the stored artifact.
    pub fn complete(
        &mut self,
        result_url: impl Into<String>,
        storage_locator: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.ensure_processing(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.result_url = Some(result_url.into());
        self.storage_locator = Some(storage_locator.into());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Record a failed attempt: the job becomes `Failed` (transient).
    ///
    /// Accepted from any non-terminal state because an attempt can fail
    /// before its `Processing` transition was persisted. Re-recording an
    /// already transient failure only replaces the message.
    pub fn fail_attempt(
        &mut self,
        message: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.ensure_not_terminal()?;
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = now;
        Ok(())
    }

    /// Resolve a transient failure into `Retrying` or terminal `Failed`.
    ///
    /// A failure at the retry ceiling already counts as terminal for
    /// [`Job::is_terminal`]; it is resolved once, which sets `completed_at`.
    /// Resolving it a second time is rejected.
    pub fn resolve_failure(&mut self, now: Timestamp) -> Result<FailureResolution, LifecycleError> {
        match self.status {
            JobStatus::Failed if self.completed_at.is_none() => {}
            JobStatus::Failed | JobStatus::Completed => {
                return Err(LifecycleError::Terminal {
                    status: self.status,
                });
            }
            from => {
                return Err(LifecycleError::InvalidTransition {
                    from,
                    to: JobStatus::Retrying,
                });
            }
        }

        if self.can_retry() {
            let previous_retry_count = self.retry_count;
            self.retry_count += 1;
            self.status = JobStatus::Retrying;
            self.updated_at = now;
            Ok(FailureResolution::Retry {
                previous_retry_count,
            })
        } else {
            self.completed_at = Some(now);
            self.updated_at = now;
            Ok(FailureResolution::Terminal)
        }
    }

    /// [`Job::fail_attempt`] followed by [`Job::resolve_failure`].
    ///
    /// Errors only when the job was terminal before this failure, in which
    /// case the record is left untouched.
    pub fn record_failure(
        &mut self,
        message: impl Into<String>,
        now: Timestamp,
    ) -> Result<FailureResolution, LifecycleError> {
        self.fail_attempt(message, now)?;
        self.resolve_failure(now)
    }

    fn ensure_not_terminal(&self) -> Result<(), LifecycleError> {
        if self.is_terminal() {
            return Err(LifecycleError::Terminal {
                status: self.status,
            });
        }
        Ok(())
    }

    fn ensure_processing(&self, to: JobStatus) -> Result<(), LifecycleError> {
        self.ensure_not_terminal()?;
        if self.status != JobStatus::Processing {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
