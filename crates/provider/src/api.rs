//! REST API client for the Replicate predictions endpoints.
//!
//! Wraps prediction creation, status lookup and output download using
//! [`reqwest`].

use async_trait::async_trait;
use mediagen_core::types::Parameters;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::provider::{GenerationProvider, Prediction, ProviderError};

/// HTTP client for the Replicate API.
pub struct ReplicateApi {
    client: reqwest::Client,
    download_client: reqwest::Client,
    api_url: String,
    api_token: String,
    model_version: String,
}

/// Response returned by `POST /predictions`.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

impl ReplicateApi {
    /// Create an API client from the loaded configuration.
    ///
    /// Fails only if the underlying HTTP clients cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let download_client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()?;

        Ok(Self {
            client,
            download_client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone().unwrap_or_default(),
            model_version: config.model_version.clone(),
        })
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.api_token)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Build the `input` object: the prompt, then every provider parameter.
///
/// Parameters are applied last, so an explicit `prompt` parameter replaces
/// the job prompt.
fn prediction_input(prompt: &str, parameters: &Parameters) -> serde_json::Value {
    let mut input = Parameters::new();
    input.insert("prompt".into(), serde_json::Value::String(prompt.to_string()));
    input.extend(parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
    serde_json::Value::Object(input)
}

#[async_trait]
impl GenerationProvider for ReplicateApi {
    /// Sends `POST /predictions` and returns the prediction id.
    async fn create(&self, prompt: &str, parameters: &Parameters) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "version": self.model_version,
            "input": prediction_input(prompt, parameters),
        });

        let response = self
            .client
            .post(format!("{}/predictions", self.api_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await?;

        let created: CreateResponse = Self::parse_response(response).await?;
        if created.id.is_empty() {
            return Err(ProviderError::Decode("prediction id is empty".into()));
        }
        tracing::debug!(prediction_id = %created.id, "Prediction created");
        Ok(created.id)
    }

    /// Sends `GET /predictions/{id}`.
    async fn poll(&self, external_ref: &str) -> Result<Prediction, ProviderError> {
        let response = self
            .client
            .get(format!("{}/predictions/{}", self.api_url, external_ref))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.download_client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_merges_prompt_and_parameters() {
        let mut params = Parameters::new();
        params.insert("width".into(), serde_json::json!(512));

        let input = prediction_input("a red fox", &params);
        assert_eq!(input["prompt"], "a red fox");
        assert_eq!(input["width"], 512);
    }

    #[test]
    fn prompt_parameter_overrides_job_prompt() {
        let mut params = Parameters::new();
        params.insert("prompt".into(), serde_json::json!("a blue fox"));

        let input = prediction_input("a red fox", &params);
        assert_eq!(input["prompt"], "a blue fox");
    }

    #[test]
    fn from_config_uses_token() {
        let config = ProviderConfig {
            api_token: Some("r8_token".into()),
            ..Default::default()
        };
        let api = ReplicateApi::from_config(&config).unwrap();
        assert_eq!(api.auth_header(), "Token r8_token");
        assert_eq!(api.api_url, "https://api.replicate.com/v1");
    }
}
