// In-memory vector store
// Holds the precomputed documentation corpus and ranks it against query vectors


pub mod corpus;
pub mod similarity;

pub use corpus::{Corpus, CorpusData, CorpusSource, ValidationError};
pub use similarity::cosine_similarity;

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::DocsError;
use crate::embeddings::EmbeddingGenerator;

/// Number of results returned when the caller does not ask for a specific count
pub const DEFAULT_TOP_K: usize = 5;

/// A single indexed documentation chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorStoreRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    /// Display-only fields such as title, url, type and language
    pub metadata: Map<String, Value>,
}

/// A ranked match for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub document: String,
    pub metadata: Map<String, Value>,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadStatus {
    Pending,
    Ready,
    Failed,
}

/// Read-only corpus with exhaustive cosine search.
///
/// The corpus is loaded exactly once. Readiness moves from `false` to `true`
/// only after the payload validates; a failed load leaves the store unready
/// for the rest of the process.
pub struct VectorStore {
    corpus: OnceLock<Corpus>,
    expected_dimension: usize,
    load_attempted: AtomicBool,
    ready: watch::Sender<bool>,
    status: watch::Sender<LoadStatus>,
}

impl VectorStore {
    /// Create an empty, unready store accepting embeddings of `expected_dimension`
    #[inline]
    pub fn new(expected_dimension: usize) -> Self {
        Self {
            corpus: OnceLock::new(),
            expected_dimension,
            load_attempted: AtomicBool::new(false),
            ready: watch::channel(false).0,
            status: watch::channel(LoadStatus::Pending).0,
        }
    }

    /// Create a store and start its single load attempt in the background.
    ///
    /// Must be called from within a Tokio runtime.
    #[inline]
    pub fn open(source: CorpusSource, expected_dimension: usize) -> Arc<Self> {
        let store = Arc::new(Self::new(expected_dimension));
        store.spawn_load(source);
        store
    }

    /// Run [`VectorStore::load`] on a background task, logging any failure
    #[inline]
    pub fn spawn_load(self: &Arc<Self>, source: CorpusSource) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = store.load(&source).await {
                error!("Vector store failed to load from {}: {}", source, e);
            }
        })
    }

    /// Fetch, parse and validate the corpus, then mark the store ready.
    ///
    /// Only the first call does any work; later calls fail without touching
    /// the store's state.
    #[inline]
    pub async fn load(&self, source: &CorpusSource) -> Result<(), DocsError> {
        self.begin_load()?;
        info!("Loading vector store from {}", source);

        let result = match source.fetch().await {
            Ok(raw) => CorpusData::from_json(&raw).and_then(|data| self.install(data)),
            Err(e) => Err(e),
        };
        self.finish_load(result)
    }

    /// Load an already parsed payload. Counts as the store's single load attempt.
    #[inline]
    pub fn load_data(&self, data: CorpusData) -> Result<(), DocsError> {
        self.begin_load()?;
        let result = self.install(data);
        self.finish_load(result)
    }

    fn begin_load(&self) -> Result<(), DocsError> {
        if self.load_attempted.swap(true, Ordering::SeqCst) {
            return Err(DocsError::Load("load already attempted".to_string()));
        }
        Ok(())
    }

    fn install(&self, data: CorpusData) -> Result<(), DocsError> {
        let corpus = data.into_corpus(self.expected_dimension)?;
        info!(
            "Validated collection '{}' with {} records",
            corpus.collection_name,
            corpus.records.len()
        );
        self.corpus
            .set(corpus)
            .map_err(|_| DocsError::Load("corpus already installed".to_string()))
    }

    fn finish_load(&self, result: Result<(), DocsError>) -> Result<(), DocsError> {
        match result {
            Ok(()) => {
                // Readiness flips before the load settles, so a woken waiter always sees it
                self.ready.send_replace(true);
                self.status.send_replace(LoadStatus::Ready);
                info!("Vector store ready");
                Ok(())
            }
            Err(e) => {
                error!("Vector store load failed: {}", e);
                self.status.send_replace(LoadStatus::Failed);
                Err(e)
            }
        }
    }

    /// Subscribe to readiness.
    ///
    /// The receiver holds the current value and observes the single
    /// `false -> true` transition if it happens. Drop it to unsubscribe.
    #[inline]
    pub fn is_ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Current readiness without subscribing
    #[inline]
    pub fn ready_now(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait for the load attempt to settle. Returns whether the store is ready.
    #[inline]
    pub async fn wait_until_ready(&self) -> bool {
        let mut status = self.status.subscribe();
        match status.wait_for(|s| *s != LoadStatus::Pending).await {
            Ok(settled) => *settled == LoadStatus::Ready,
            Err(_) => self.ready_now(),
        }
    }

    /// Name of the loaded collection, if any
    #[inline]
    pub fn collection_name(&self) -> Option<&str> {
        self.corpus.get().map(|c| c.collection_name.as_str())
    }

    /// Number of loaded records (zero before the store is ready)
    #[inline]
    pub fn len(&self) -> usize {
        self.corpus.get().map_or(0, |c| c.records.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn expected_dimension(&self) -> usize {
        self.expected_dimension
    }

    /// Rank every stored record against `query_vector` and return the best `top_k`.
    ///
    /// Results are sorted by descending similarity; equal scores keep corpus order.
    #[inline]
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>, DocsError> {
        if !self.ready_now() {
            return Err(DocsError::NotLoaded);
        }
        let corpus = self.corpus.get().ok_or(DocsError::NotLoaded)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored = corpus
            .records
            .iter()
            .map(|record| {
                cosine_similarity(&record.embedding, query_vector).map(|score| (score, record))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        debug!(
            "Scored {} records, returning {} results",
            corpus.records.len(),
            scored.len()
        );

        Ok(scored
            .into_iter()
            .map(|(similarity, record)| SearchResult {
                id: record.id.clone(),
                document: record.document.clone(),
                metadata: record.metadata.clone(),
                similarity,
            })
            .collect())
    }

    /// Embed `text` with `embedder` and search with the resulting vector
    #[inline]
    pub fn query_text(
        &self,
        embedder: &dyn EmbeddingGenerator,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DocsError> {
        let query_vector = embedder.embed(text);
        self.search(&query_vector, top_k)
    }
}

impl std::fmt::Debug for VectorStore {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("collection_name", &self.collection_name())
            .field("records", &self.len())
            .field("expected_dimension", &self.expected_dimension)
            .field("ready", &self.ready_now())
            .finish()
    }
}
