
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use super::http::JsonHttpClient;
use super::{MODEL_FAILURE_MESSAGE, ModelBackend};
use crate::DocsError;
use crate::config::ModelConfig;

/// Client for a hosted text-generation inference API (Hugging Face style)
#[derive(Debug, Clone)]
pub struct HostedInferenceClient {
    endpoint: Url,
    api_key: Option<String>,
    temperature: f32,
    max_new_tokens: u32,
    http: JsonHttpClient,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    temperature: f32,
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generated(Vec<GeneratedText>),
    Error { error: String },
    Single(GeneratedText),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

impl HostedInferenceClient {
    #[inline]
    pub fn new(config: &ModelConfig) -> Result<Self, DocsError> {
        let mut endpoint = config
            .hosted_base_url()
            .map_err(|e| DocsError::Config(e.to_string()))?;
        endpoint
            .path_segments_mut()
            .map_err(|()| DocsError::Config(format!("Invalid hosted URL: {}", config.hosted_url)))?
            .pop_if_empty()
            .extend(config.model.split('/').filter(|s| !s.is_empty()));

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!("No API key configured for hosted inference; requests are sent unauthenticated");
        }

        Ok(Self {
            endpoint,
            api_key,
            temperature: config.temperature,
            max_new_tokens: config.max_tokens,
            http: JsonHttpClient::new(
                Duration::from_secs(config.timeout_seconds),
                config.retry_attempts,
            ),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.http = self.http.with_retry_attempts(attempts);
        self
    }

    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Blocking inference call
    #[inline]
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                temperature: self.temperature,
                max_new_tokens: self.max_new_tokens,
                return_full_text: false,
            },
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize inference request")?;

        debug!(
            "Sending inference request to {} (prompt length: {})",
            self.endpoint,
            prompt.len()
        );

        let response_text = self
            .http
            .post_json(
                self.endpoint.as_str(),
                &request_json,
                self.api_key.as_deref(),
            )
            .context("Failed to call inference endpoint")?;

        let response: InferenceResponse = serde_json::from_str(&response_text)
            .context("Failed to parse inference response")?;

        let generated = match response {
            InferenceResponse::Generated(items) => items.into_iter().next(),
            InferenceResponse::Single(item) => Some(item),
            InferenceResponse::Error { error } => {
                return Err(anyhow!("Inference API error: {}", error));
            }
        };

        let text = generated
            .and_then(|item| item.generated_text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| anyhow!("Invalid response: missing generated_text field"))?;

        debug!("Received generated text (length: {})", text.len());
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ModelBackend for HostedInferenceClient {
    #[inline]
    async fn complete(&self, prompt: &str) -> Result<String, DocsError> {
        let client = self.clone();
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || client.generate(&prompt))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result)
            .map_err(|e| {
                error!("Hosted inference failed: {:#}", e);
                DocsError::ModelCall(MODEL_FAILURE_MESSAGE.to_string())
            })
    }

    #[inline]
    fn name(&self) -> &str {
        "hosted"
    }
}
