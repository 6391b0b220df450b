// Conversation orchestration
// Runs retrieval, prompting and the model call for each submitted question


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::DocsError;
use crate::config::Config;
use crate::embeddings::EmbeddingGenerator;
use crate::model::ModelBackend;
use crate::prompt::PromptBuilder;
use crate::retrieval::format_search_results;
use crate::vector_store::{DEFAULT_TOP_K, VectorStore};

/// Language used for code examples when the caller has no preference
pub const DEFAULT_PREFERRED_LANGUAGE: &str = "python";

/// Prefix of every assistant reply that reports a failure
pub const ERROR_REPLY_PREFIX: &str = "I encountered an error while processing your question";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    #[inline]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What happened to a submitted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The model answered and the reply was logged
    Answered,
    /// The request failed and an error reply was logged
    Failed,
    /// Another message was still being answered; nothing was logged
    Busy,
    /// The message was empty or whitespace; nothing was logged
    Blank,
}

/// One conversation: an append-only message log plus the loading flag.
///
/// At most one message is processed at a time. Submissions made while a
/// message is in flight are dropped rather than queued.
pub struct ChatSession {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingGenerator>,
    model: Arc<dyn ModelBackend>,
    prompt: PromptBuilder,
    top_k: usize,
    production: bool,
    messages: watch::Sender<Vec<Message>>,
    loading: watch::Sender<bool>,
    in_flight: AtomicBool,
}

/// Clears the in-flight state even if the answering future is dropped
struct FlightGuard<'a> {
    session: &'a ChatSession,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.session.loading.send_replace(false);
        self.session.in_flight.store(false, Ordering::SeqCst);
    }
}

impl ChatSession {
    #[inline]
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingGenerator>,
        model: Arc<dyn ModelBackend>,
    ) -> Self {
        Self {
            store,
            embedder,
            model,
            prompt: PromptBuilder::default(),
            top_k: DEFAULT_TOP_K,
            production: false,
            messages: watch::channel(Vec::new()).0,
            loading: watch::channel(false).0,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Build a session using the assistant settings from `config`
    #[inline]
    pub fn from_config(
        config: &Config,
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingGenerator>,
        model: Arc<dyn ModelBackend>,
    ) -> Self {
        Self::new(store, embedder, model)
            .with_prompt_builder(PromptBuilder::from_config(&config.assistant))
            .with_top_k(config.assistant.top_k)
            .with_production(config.assistant.production)
    }

    #[inline]
    pub fn with_prompt_builder(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// In production mode error replies omit diagnostic detail
    #[inline]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Subscribe to the message log. The receiver sees the full log after every append.
    #[inline]
    pub fn messages(&self) -> watch::Receiver<Vec<Message>> {
        self.messages.subscribe()
    }

    /// Subscribe to the loading flag
    #[inline]
    pub fn loading_state(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Snapshot of the message log
    #[inline]
    pub fn history(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    #[inline]
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Wait for the store to settle and greet an empty conversation.
    ///
    /// Returns whether the welcome message was appended.
    #[inline]
    pub async fn greet_when_ready(&self) -> bool {
        if !self.store.wait_until_ready().await {
            return false;
        }

        let welcome = self.prompt.welcome_message();
        self.messages.send_if_modified(|log| {
            if log.is_empty() {
                log.push(Message::new(Role::Assistant, welcome));
                true
            } else {
                false
            }
        })
    }

    /// Submit a user message and wait for it to be answered.
    ///
    /// Failures never escape: they are logged as an assistant reply instead.
    #[inline]
    pub async fn send_message(&self, content: &str, preferred_language: &str) -> SubmitOutcome {
        if content.trim().is_empty() {
            return SubmitOutcome::Blank;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Ignoring message submitted while another is in flight");
            return SubmitOutcome::Busy;
        }
        let _guard = FlightGuard { session: self };

        self.append(Role::User, content);
        self.loading.send_replace(true);

        match self.answer(content, preferred_language).await {
            Ok(reply) => {
                self.append(Role::Assistant, reply);
                SubmitOutcome::Answered
            }
            Err(e) => {
                error!("Error processing message: {}", e);
                self.append(Role::Assistant, self.error_reply(&e));
                SubmitOutcome::Failed
            }
        }
    }

    async fn answer(&self, query: &str, preferred_language: &str) -> Result<String, DocsError> {
        if !self.store.ready_now() {
            return Err(DocsError::StoreNotReady);
        }

        let query_vector = self.embedder.embed(query);
        let results = self.store.search(&query_vector, self.top_k)?;
        debug!("Retrieved {} documents for query", results.len());

        let context = format_search_results(&results);
        let prompt = self.prompt.build(query, &context, preferred_language);

        let reply = self.model.complete(&prompt).await?;
        info!(
            "{} backend answered (reply length: {})",
            self.model.name(),
            reply.len()
        );
        Ok(reply)
    }

    fn error_reply(&self, error: &DocsError) -> String {
        if self.production {
            format!("{}. Please try again later.", ERROR_REPLY_PREFIX)
        } else {
            format!("{}: {}", ERROR_REPLY_PREFIX, error)
        }
    }

    fn append(&self, role: Role, content: impl Into<String>) {
        let message = Message::new(role, content);
        self.messages.send_modify(|log| log.push(message));
    }
}
