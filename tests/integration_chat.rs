#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests: a corpus file on disk, a mocked completion server,
// and a session wired together from config.toml the way the CLI does it.

use docs_assistant::chat::{ChatSession, Role, SubmitOutcome};
use docs_assistant::commands::open_store;
use docs_assistant::config::{BackendKind, Config};
use docs_assistant::embeddings::{CharCodeEmbedder, EmbeddingGenerator};
use docs_assistant::model;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIMENSION: usize = 64;

const AUTH_DOC: &str = "Authenticate every request with a bearer token in the Authorization header.";
const WEBHOOK_DOC: &str = "Webhooks deliver signed event payloads to your HTTPS endpoint.";

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

fn write_corpus(dir: &TempDir) {
    let embedder = CharCodeEmbedder::new(DIMENSION);
    let corpus = json!({
        "collection_name": "api_docs",
        "ids": ["auth", "webhooks"],
        "embeddings": [embedder.embed(AUTH_DOC), embedder.embed(WEBHOOK_DOC)],
        "documents": [AUTH_DOC, WEBHOOK_DOC],
        "metadatas": [
            { "title": "Authentication", "url": "https://docs.example.com/auth", "type": "guide" },
            { "title": "Webhooks", "url": "https://docs.example.com/webhooks", "language": "python" }
        ]
    });
    fs::write(dir.path().join("vector_store.json"), corpus.to_string())
        .expect("Failed to write corpus");
}

fn write_config(dir: &TempDir, server: &MockServer, production: bool) -> Config {
    let address = server.address();
    let mut config = Config::load(dir.path()).expect("Failed to load default config");
    config.corpus.embedding_dimension = DIMENSION;
    config.model.backend = BackendKind::Local;
    config.model.host = address.ip().to_string();
    config.model.port = address.port();
    config.model.model = "test-model".to_string();
    config.model.retry_attempts = 1;
    config.assistant.assistant_name = "Ada".to_string();
    config.assistant.product_name = "Acme Pay".to_string();
    config.assistant.top_k = 1;
    config.assistant.production = production;
    config.save().expect("Failed to save config");

    Config::load(dir.path()).expect("Failed to reload config")
}

async fn session_for(config: &Config) -> ChatSession {
    init_test_tracing();
    let store = open_store(config).await.expect("Failed to open store");
    let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(CharCodeEmbedder::new(DIMENSION));
    let backend = model::from_config(&config.model).expect("Failed to create backend");
    ChatSession::from_config(config, store, embedder, backend)
}

#[tokio::test]
async fn question_is_answered_from_the_closest_document() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let server = MockServer::start().await;
    write_corpus(&dir);
    let config = write_config(&dir, &server, false);

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_string_contains("You are Ada"))
        .and(body_string_contains("DOCUMENT: Authentication"))
        .and(body_string_contains("prefer examples written in rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": " Send the token in the Authorization header. " }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&config).await;
    assert!(session.greet_when_ready().await);

    let outcome = session.send_message(AUTH_DOC, "rust").await;
    assert_eq!(outcome, SubmitOutcome::Answered);

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::Assistant);
    assert!(history[0].content.contains("Acme Pay"));
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[1].content, AUTH_DOC);
    assert_eq!(history[2].role, Role::Assistant);
    assert_eq!(history[2].content, "Send the token in the Authorization header.");
    assert!(!session.is_loading());
}

#[tokio::test]
async fn model_failure_is_reported_in_the_conversation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let server = MockServer::start().await;
    write_corpus(&dir);
    let config = write_config(&dir, &server, true);

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&config).await;
    let outcome = session.send_message("How do webhooks work?", "python").await;
    assert_eq!(outcome, SubmitOutcome::Failed);

    let history = session.history();
    let reply = history.last().expect("reply should be logged");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(
        reply.content,
        "I encountered an error while processing your question. Please try again later."
    );
}

#[tokio::test]
async fn missing_corpus_leaves_the_store_unready() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let server = MockServer::start().await;
    let config = write_config(&dir, &server, false);

    let session = session_for(&config).await;
    assert!(!session.greet_when_ready().await);

    let outcome = session.send_message("Anything?", "python").await;
    assert_eq!(outcome, SubmitOutcome::Failed);

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert!(history[1].content.contains("Vector store not yet loaded"));

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
