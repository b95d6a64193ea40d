//! Job record, status enum and creation-time validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{JobId, Parameters, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum prompt length in characters (before trimming).
pub const MAX_PROMPT_LEN: u64 = 2000;

/// Retry ceiling applied when the client does not choose one.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Highest retry ceiling a client may request.
pub const MAX_RETRIES_LIMIT: i32 = 10;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Job execution status.
///
/// Discriminants match the seed order of the `job_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending = 1,
    Processing = 2,
    Retrying = 3,
    Completed = 4,
    Failed = 5,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Retrying,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Lowercase wire name, as used in API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a lowercase wire name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown job status '{name}'")))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One generation request and its lifecycle record.
///
/// State changes go through the methods in [`crate::lifecycle`]; the fields
/// are public so stores can hydrate and persist records verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    pub parameters: Parameters,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub result_url: Option<String>,
    pub storage_locator: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_message: Option<String>,
    pub external_ref: Option<String>,
}

/// Input for creating a job, as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewJob {
    #[validate(length(min = 1, max = MAX_PROMPT_LEN))]
    pub prompt: String,
    #[serde(default)]
    pub parameters: Option<Parameters>,
    #[validate(range(min = 0, max = MAX_RETRIES_LIMIT))]
    pub max_retries: Option<i32>,
}

impl Job {
    /// Validate `input` and build a fresh `Pending` job.
    ///
    /// The prompt is stored trimmed; a prompt that is empty after trimming
    /// is rejected. `default_max_retries` applies when the input omits one.
    pub fn create(
        input: NewJob,
        default_max_retries: i32,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let prompt = input.prompt.trim();
        if prompt.is_empty() {
            return Err(CoreError::Validation(
                "Prompt cannot be empty or only whitespace".to_string(),
            ));
        }

        let max_retries = input.max_retries.unwrap_or(default_max_retries);
        if !(0..=MAX_RETRIES_LIMIT).contains(&max_retries) {
            return Err(CoreError::Validation(format!(
                "max_retries must be between 0 and {MAX_RETRIES_LIMIT}"
            )));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4(),
            prompt: prompt.to_string(),
            parameters: input.parameters.unwrap_or_default(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            result_url: None,
            storage_locator: None,
            retry_count: 0,
            max_retries,
            error_message: None,
            external_ref: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_job(prompt: &str) -> NewJob {
        NewJob {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn job_status_ids_match_seed_data() {
        assert_eq!(JobStatus::Pending.id(), 1);
        assert_eq!(JobStatus::Processing.id(), 2);
        assert_eq!(JobStatus::Retrying.id(), 3);
        assert_eq!(JobStatus::Completed.id(), 4);
        assert_eq!(JobStatus::Failed.id(), 5);
    }

    #[test]
    fn status_id_round_trips() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(JobStatus::from_id(0), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(JobStatus::Retrying).unwrap();
        assert_eq!(json, "retrying");
        assert_eq!(JobStatus::from_name("failed").unwrap(), JobStatus::Failed);
        assert!(JobStatus::from_name("FAILED").is_err());
    }

    #[test]
    fn prompt_is_trimmed() {
        let job = Job::create(new_job("  x  "), DEFAULT_MAX_RETRIES, chrono::Utc::now()).unwrap();
        assert_eq!(job.prompt, "x");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.max_retries, DEFAULT_MAX_RETRIES);
        assert!(job.parameters.is_empty());
    }

    #[test]
    fn empty_prompt_rejected() {
        let result = Job::create(new_job(""), DEFAULT_MAX_RETRIES, chrono::Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn whitespace_prompt_rejected() {
        let result = Job::create(new_job(" \t\n "), DEFAULT_MAX_RETRIES, chrono::Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_prompt_rejected() {
        let prompt = "a".repeat(MAX_PROMPT_LEN as usize + 1);
        let result = Job::create(new_job(&prompt), DEFAULT_MAX_RETRIES, chrono::Utc::now());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn max_retries_override_bounds() {
        let mut input = new_job("cat");
        input.max_retries = Some(0);
        assert_eq!(Job::create(input.clone(), 3, chrono::Utc::now()).unwrap().max_retries, 0);

        input.max_retries = Some(10);
        assert_eq!(Job::create(input.clone(), 3, chrono::Utc::now()).unwrap().max_retries, 10);

        input.max_retries = Some(11);
        assert!(Job::create(input.clone(), 3, chrono::Utc::now()).is_err());

        input.max_retries = Some(-1);
        assert!(Job::create(input, 3, chrono::Utc::now()).is_err());
    }

    #[test]
    fn timestamps_start_equal() {
        let now = chrono::Utc::now();
        let job = Job::create(new_job("dog"), 3, now).unwrap();
        assert_eq!(job.created_at, now);
        assert_eq!(job.updated_at, now);
        assert!(job.started_at.is_none());
        assert!(job.completed_at.is_none());
    }
}
