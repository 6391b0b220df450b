use anyhow::{Context, Result, anyhow, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::chat::{ChatSession, Message, Role, SubmitOutcome};
use crate::config::Config;
use crate::embeddings::{CharCodeEmbedder, EmbeddingGenerator};
use crate::model;
use crate::retrieval::format_search_results;
use crate::vector_store::VectorStore;

const EXIT_COMMANDS: &[&str] = &["/exit", "/quit"];

/// Open the configured corpus and wait for its single load attempt
#[inline]
pub async fn open_store(config: &Config) -> Result<Arc<VectorStore>> {
    let source = config
        .corpus_source()
        .context("Invalid corpus source in configuration")?;
    let store = VectorStore::open(source, config.corpus.embedding_dimension);

    if store.wait_until_ready().await {
        info!(
            "Loaded {} documents from collection '{}'",
            store.len(),
            store.collection_name().unwrap_or_default()
        );
    } else {
        warn!("Vector store is not available; questions will be answered with an error");
    }

    Ok(store)
}

fn build_session(config: &Config, store: Arc<VectorStore>) -> Result<ChatSession> {
    let embedder: Arc<dyn EmbeddingGenerator> =
        Arc::new(CharCodeEmbedder::new(config.corpus.embedding_dimension));
    let backend = model::from_config(&config.model).context("Failed to create model backend")?;

    Ok(ChatSession::from_config(config, store, embedder, backend))
}

/// Answer a single question and print the reply
#[inline]
pub async fn ask(config: &Config, question: &str, language: Option<String>) -> Result<()> {
    let store = open_store(config).await?;
    let session = build_session(config, store)?;
    let language = language.unwrap_or_else(|| config.assistant.preferred_language.clone());

    let spinner = spawn_loading_spinner(session.loading_state());
    let outcome = session.send_message(question, &language).await;
    spinner.abort();

    if outcome == SubmitOutcome::Blank {
        bail!("Question cannot be empty");
    }

    let reply = session
        .history()
        .into_iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .ok_or_else(|| anyhow!("No reply was produced"))?;
    println!("{}", reply.content);

    if outcome == SubmitOutcome::Failed {
        bail!("Failed to answer question");
    }
    Ok(())
}

/// Interactive conversation on stdin
#[inline]
pub async fn chat(config: &Config, language: Option<String>) -> Result<()> {
    let store = open_store(config).await?;
    let session = build_session(config, store)?;
    let language = language.unwrap_or_else(|| config.assistant.preferred_language.clone());

    session.greet_when_ready().await;
    let mut printed = print_new_messages(&session.history(), 0);

    eprintln!(
        "{}",
        style(format!(
            "Ask a question (code examples in {}). Type /exit to quit.",
            language
        ))
        .dim()
    );

    let spinner = spawn_loading_spinner(session.loading_state());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", style(">").bold().cyan());
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let line = line.trim();
        if EXIT_COMMANDS.contains(&line) {
            break;
        }

        if session.send_message(line, &language).await == SubmitOutcome::Blank {
            continue;
        }
        printed = print_new_messages(&session.history(), printed);
    }

    spinner.abort();
    Ok(())
}

/// Run retrieval only and print the context block the model would receive
#[inline]
pub async fn search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let store = open_store(config).await?;
    if !store.ready_now() {
        bail!("Vector store failed to load; see the log for details");
    }

    let embedder = CharCodeEmbedder::new(config.corpus.embedding_dimension);
    let results = store
        .query_text(&embedder, query, limit.unwrap_or(config.assistant.top_k))
        .context("Search failed")?;

    println!("{}", format_search_results(&results));
    Ok(())
}

/// Check that the configured model backend answers
#[inline]
pub async fn ping(config: &Config) -> Result<()> {
    eprintln!(
        "Testing {} backend with model {}...",
        config.model.backend, config.model.model
    );

    match model::test_connection(&config.model).await {
        Ok(reply) => {
            eprintln!("{}", style("✓ Model connection successful").green());
            println!("{}", reply);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", style("✗ Model connection failed").red());
            Err(anyhow!(e))
        }
    }
}

fn print_new_messages(history: &[Message], already_printed: usize) -> usize {
    for message in history.iter().skip(already_printed) {
        if message.role == Role::Assistant {
            println!();
            println!("{}", message.content);
            println!();
        }
    }
    history.len()
}

/// Show a spinner on stderr whenever the session is waiting on an answer
fn spawn_loading_spinner(mut loading: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("style template is valid"),
        );

        while loading.changed().await.is_ok() {
            if *loading.borrow_and_update() {
                bar.reset();
                bar.set_message("Searching documentation and asking the model...");
                bar.enable_steady_tick(Duration::from_millis(100));
            } else {
                bar.disable_steady_tick();
                bar.finish_and_clear();
            }
        }
    })
}
