//! Status ID helpers for the `job_statuses` lookup table.

use mediagen_core::job::JobStatus;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Statuses a job can still make progress from.
pub const ACTIVE_STATUSES: [JobStatus; 3] = [
    JobStatus::Pending,
    JobStatus::Processing,
    JobStatus::Retrying,
];

/// Convert a list of statuses into their database IDs.
pub fn status_ids(statuses: &[JobStatus]) -> Vec<StatusId> {
    statuses.iter().map(|s| s.id()).collect()
}
