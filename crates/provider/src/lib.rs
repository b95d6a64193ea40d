//! Generation provider capability and its Replicate implementation.
//!
//! The execution engine only sees [`GenerationProvider`]: start a request,
//! poll it, fetch its output. [`ReplicateApi`] speaks the Replicate
//! predictions API over HTTP; [`MockProvider`] answers offline when no API
//! token is configured.

pub mod api;
pub mod config;
pub mod mock;
pub mod output;
pub mod provider;

use std::sync::Arc;

pub use api::ReplicateApi;
pub use config::ProviderConfig;
pub use mock::MockProvider;
pub use provider::{GenerationProvider, Prediction, PredictionStatus, ProviderError};

/// Build the provider selected by `config`.
///
/// Falls back to [`MockProvider`] when no usable API token is configured.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn GenerationProvider>, ProviderError> {
    if !config.has_token() {
        tracing::warn!(
            "REPLICATE_API_TOKEN is not configured; media generation will use the mock provider"
        );
        return Ok(Arc::new(MockProvider::new()));
    }

    tracing::info!(api_url = %config.api_url, "Using Replicate generation provider");
    Ok(Arc::new(ReplicateApi::from_config(config)?))
}
