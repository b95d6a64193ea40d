use async_trait::async_trait;
use mediagen_core::types::Parameters;

use crate::provider::{GenerationProvider, Prediction, PredictionStatus, ProviderError};

/// Placeholder bytes returned by [`MockProvider::download`].
const MOCK_IMAGE: &[u8] = b"mock-media-content";

/// Offline provider used when no API token is configured.
///
/// Every request succeeds immediately with a single output URL.
#[derive(Debug, Default, Clone)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn create(&self, prompt: &str, _parameters: &Parameters) -> Result<String, ProviderError> {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(prediction_id = %id, prompt_len = prompt.len(), "Mock prediction created");
        Ok(id)
    }

    async fn poll(&self, external_ref: &str) -> Result<Prediction, ProviderError> {
        Ok(Prediction {
            id: external_ref.to_string(),
            status: PredictionStatus::Succeeded,
            output: vec![format!("https://replicate.delivery/mock/{external_ref}.jpg")],
            error: None,
        })
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        Ok(MOCK_IMAGE.to_vec())
    }
}
