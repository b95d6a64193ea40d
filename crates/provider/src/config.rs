//! Provider configuration loaded from environment variables.

use std::time::Duration;

/// Replicate model version used when `REPLICATE_MODEL_VERSION` is unset.
pub const DEFAULT_MODEL_VERSION: &str =
    "stability-ai/sdxl:39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

/// Token values shipped in sample env files. Treated as "no token".
const PLACEHOLDER_TOKENS: &[&str] = &[
    "your_replicate_api_token_here",
    "your_actual_replicate_api_token_here",
];

/// Settings for the generation provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API token; `None` selects the mock provider.
    pub api_token: Option<String>,
    /// Base URL of the predictions API (default: `https://api.replicate.com/v1`).
    pub api_url: String,
    /// Model version sent with every create request.
    pub model_version: String,
    /// Timeout for create and poll requests (default: `30`s).
    pub request_timeout: Duration,
    /// Timeout for output downloads (default: `60`s).
    pub download_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_url: "https://api.replicate.com/v1".into(),
            model_version: DEFAULT_MODEL_VERSION.into(),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                          |
    /// |---------------------------------|----------------------------------|
    /// | `REPLICATE_API_TOKEN`           | (none, mock provider)            |
    /// | `REPLICATE_API_URL`             | `https://api.replicate.com/v1`   |
    /// | `REPLICATE_MODEL_VERSION`       | SDXL                             |
    /// | `PROVIDER_REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `DOWNLOAD_TIMEOUT_SECS`         | `60`                             |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_token = std::env::var("REPLICATE_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let api_url = std::env::var("REPLICATE_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let model_version = std::env::var("REPLICATE_MODEL_VERSION")
            .unwrap_or(defaults.model_version);

        let request_timeout_secs: u64 = std::env::var("PROVIDER_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PROVIDER_REQUEST_TIMEOUT_SECS must be a valid u64");

        let download_timeout_secs: u64 = std::env::var("DOWNLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("DOWNLOAD_TIMEOUT_SECS must be a valid u64");

        Self {
            api_token,
            api_url,
            model_version,
            request_timeout: Duration::from_secs(request_timeout_secs),
            download_timeout: Duration::from_secs(download_timeout_secs),
        }
    }

    /// Whether a real (non-placeholder) API token is configured.
    pub fn has_token(&self) -> bool {
        match self.api_token.as_deref() {
            Some(token) => !token.is_empty() && !PLACEHOLDER_TOKENS.contains(&token),
            None => false,
        }
    }
}
