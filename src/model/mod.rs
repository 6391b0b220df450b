// Language model backends
// A single completion capability with interchangeable local and hosted implementations

pub mod hosted;
pub mod http;
pub mod local;

pub use hosted::HostedInferenceClient;
pub use local::LocalCompletionClient;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::DocsError;
use crate::config::{BackendKind, ModelConfig};

/// Message surfaced for every failed model call; the cause is logged
pub const MODEL_FAILURE_MESSAGE: &str = "Failed to generate response from the AI model";

/// Prompt sent when checking that a backend answers
pub const CONNECTION_TEST_PROMPT: &str = "Hello!";

/// Turns a prompt into generated text
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, DocsError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Build the backend selected by the configuration
#[inline]
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn ModelBackend>, DocsError> {
    let backend: Arc<dyn ModelBackend> = match config.backend {
        BackendKind::Local => Arc::new(LocalCompletionClient::new(config)?),
        BackendKind::Hosted => Arc::new(HostedInferenceClient::new(config)?),
    };
    info!("Using {} model backend ({})", backend.name(), config.model);
    Ok(backend)
}

/// Send a short prompt to the configured backend and return its reply
#[inline]
pub async fn test_connection(config: &ModelConfig) -> Result<String, DocsError> {
    let backend = from_config(config)?;
    backend.complete(CONNECTION_TEST_PROMPT).await
}
