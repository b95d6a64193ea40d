//! The [`GenerationProvider`] capability and its wire types.

use async_trait::async_trait;
use mediagen_core::types::Parameters;
use serde::{Deserialize, Deserializer};

/// Errors from talking to a generation provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response could not be interpreted.
    #[error("Invalid provider response: {0}")]
    Decode(String),
}

/// Provider-side status of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    /// `succeeded`, `failed` or `canceled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// A snapshot of a generation request.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    /// Opaque provider handle (the job's external ref).
    pub id: String,
    pub status: PredictionStatus,
    /// Output references. The provider may send a list or a single URL.
    #[serde(default, deserialize_with = "deserialize_output")]
    pub output: Vec<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl Prediction {
    /// Human-readable provider error, if any was reported.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn deserialize_output<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(url)) => vec![url],
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// External generation capability used by the execution engine.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a generation request and return its external ref.
    async fn create(&self, prompt: &str, parameters: &Parameters) -> Result<String, ProviderError>;

    /// Fetch the current state of a request.
    async fn poll(&self, external_ref: &str) -> Result<Prediction, ProviderError>;

    /// Download the bytes behind an output reference.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Prediction {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn output_list_is_parsed() {
        let p = parse(serde_json::json!({
            "id": "abc",
            "status": "succeeded",
            "output": ["https://x/a.png", "https://x/b.png"]
        }));
        assert_eq!(p.status, PredictionStatus::Succeeded);
        assert_eq!(p.output, vec!["https://x/a.png", "https://x/b.png"]);
    }

    #[test]
    fn single_output_string_becomes_list() {
        let p = parse(serde_json::json!({
            "id": "abc", "status": "succeeded", "output": "https://x/a.webp"
        }));
        assert_eq!(p.output, vec!["https://x/a.webp"]);
    }

    #[test]
    fn missing_or_null_output_is_empty() {
        let p = parse(serde_json::json!({"id": "abc", "status": "succeeded"}));
        assert!(p.output.is_empty());
        let p = parse(serde_json::json!({"id": "abc", "status": "succeeded", "output": null}));
        assert!(p.output.is_empty());
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let p = parse(serde_json::json!({"id": "abc", "status": "queued"}));
        assert_eq!(p.status, PredictionStatus::Unknown);
        assert!(!p.status.is_terminal());
        assert!(PredictionStatus::Canceled.is_terminal());
        assert!(!PredictionStatus::Starting.is_terminal());
    }

    #[test]
    fn error_message_variants() {
        let p = parse(serde_json::json!({"id": "a", "status": "failed", "error": "NSFW"}));
        assert_eq!(p.error_message().as_deref(), Some("NSFW"));
        let p = parse(serde_json::json!({"id": "a", "status": "failed", "error": null}));
        assert_eq!(p.error_message(), None);
        let p = parse(serde_json::json!({"id": "a", "status": "failed", "error": {"code": 1}}));
        assert_eq!(p.error_message().as_deref(), Some("{\"code\":1}"));
    }
}
