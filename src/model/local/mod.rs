
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::http::JsonHttpClient;
use super::{MODEL_FAILURE_MESSAGE, ModelBackend};
use crate::DocsError;
use crate::config::ModelConfig;

/// Client for an OpenAI-compatible `/v1/completions` endpoint such as LM Studio
#[derive(Debug, Clone)]
pub struct LocalCompletionClient {
    endpoint: Url,
    model: String,
    temperature: f32,
    max_tokens: u32,
    http: JsonHttpClient,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

impl LocalCompletionClient {
    #[inline]
    pub fn new(config: &ModelConfig) -> Result<Self, DocsError> {
        let endpoint = config
            .local_url()
            .map_err(|e| DocsError::Config(e.to_string()))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
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

    /// Blocking completion call
    #[inline]
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize completion request")?;

        debug!(
            "Sending completion request to {} (prompt length: {})",
            self.endpoint,
            prompt.len()
        );

        let response_text = self
            .http
            .post_json(self.endpoint.as_str(), &request_json, None)
            .context("Failed to call completion endpoint")?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse completion response")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| anyhow!("Invalid response: missing choices or text field"))?;

        debug!("Received completion (length: {})", text.len());
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ModelBackend for LocalCompletionClient {
    #[inline]
    async fn complete(&self, prompt: &str) -> Result<String, DocsError> {
        let client = self.clone();
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || client.generate(&prompt))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result)
            .map_err(|e| {
                error!("Local completion failed: {:#}", e);
                DocsError::ModelCall(MODEL_FAILURE_MESSAGE.to_string())
            })
    }

    #[inline]
    fn name(&self) -> &str {
        "local"
    }
}
