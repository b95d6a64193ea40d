//! Startup recovery sweep.
//!
//! The dispatch queue lives in memory, so anything that was queued,
//! running or waiting for a retry when the process stopped is lost. On
//! startup every job that can still make progress is put back on the
//! queue. A `Processing` job with a persisted external ref resumes polling
//! that request instead of starting a new one.

use chrono::Utc;
use mediagen_core::lifecycle::FailureResolution;
use mediagen_db::models::status::ACTIVE_STATUSES;
use mediagen_db::{JobStore, StoreError};

use crate::dispatcher::Dispatcher;

/// What the recovery sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Transiently failed jobs moved to `Retrying`.
    pub resolved: usize,
    /// Jobs handed to the dispatcher.
    pub enqueued: usize,
}

/// Re-enqueue unfinished jobs found in `store`.
pub async fn recover(
    store: &dyn JobStore,
    dispatcher: &Dispatcher,
) -> Result<RecoveryReport, StoreError> {
    let mut report = RecoveryReport::default();

    // A failure that was recorded but never resolved.
    for mut job in store.list_retryable().await? {
        let now = Utc::now();
        match job.resolve_failure(now) {
            Ok(FailureResolution::Retry { .. }) => {
                store.update(&job).await?;
                report.resolved += 1;
            }
            Ok(FailureResolution::Terminal) | Err(_) => {
                tracing::warn!(job_id = %job.id, status = %job.status, "Skipping unresolvable job during recovery");
            }
        }
    }

    for job in store.list_by_statuses(&ACTIVE_STATUSES).await? {
        if dispatcher.enqueue(job.id).await {
            report.enqueued += 1;
        }
    }

    tracing::info!(
        resolved = report.resolved,
        enqueued = report.enqueued,
        "Recovery sweep complete",
    );
    Ok(report)
}
