/// Jobs are keyed by a random UUID assigned at creation.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Free-form generation parameters, passed through to the provider.
pub type Parameters = serde_json::Map<String, serde_json::Value>;
