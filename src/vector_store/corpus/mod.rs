
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::VectorStoreRecord;
use crate::DocsError;

const FETCH_TIMEOUT_SECONDS: u64 = 30;
// Exported corpora routinely exceed ureq's 10 MB default body limit
const MAX_CORPUS_BYTES: u64 = 1024 * 1024 * 1024;

/// Raw corpus payload as exported by the indexing pipeline.
///
/// Every array is optional at the parsing stage so that a payload missing
/// one of them is reported by [`CorpusData::validate`] rather than as an
/// opaque parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusData {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub documents: Option<Vec<String>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Map<String, Value>>>>,
    #[serde(default)]
    pub collection_name: Option<String>,
}

/// Validated, immutable corpus held by the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    pub collection_name: String,
    pub records: Vec<VectorStoreRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error(
        "array lengths differ (ids: {ids}, embeddings: {embeddings}, documents: {documents}, metadatas: {metadatas})"
    )]
    LengthMismatch {
        ids: usize,
        embeddings: usize,
        documents: usize,
        metadatas: usize,
    },
    #[error("embedding for '{id}' has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
    #[error("embedding for '{id}' contains non-finite values")]
    NonFiniteValue { id: String },
    #[error("duplicate id: {0}")]
    DuplicateId(String),
}

/// Where the corpus payload is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    File(PathBuf),
    Url(Url),
}

impl CorpusSource {
    /// Interpret a configured source string. `http://` and `https://` values are
    /// fetched over the network, anything else is treated as a file path.
    #[inline]
    pub fn parse(source: &str) -> Result<Self, DocsError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(DocsError::Config("corpus source cannot be empty".to_string()));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| DocsError::Config(format!("Invalid corpus URL {}: {}", trimmed, e)))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::File(PathBuf::from(trimmed)))
        }
    }

    /// Read the raw payload. A single attempt is made, failures are not retried.
    #[inline]
    pub async fn fetch(&self) -> Result<String, DocsError> {
        match self {
            Self::File(path) => {
                debug!("Reading corpus from {}", path.display());
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    DocsError::Load(format!(
                        "Failed to read corpus file {}: {}",
                        path.display(),
                        e
                    ))
                })
            }
            Self::Url(url) => {
                debug!("Fetching corpus from {}", url);
                let url = url.clone();
                tokio::task::spawn_blocking(move || {
                    let agent: ureq::Agent = ureq::Agent::config_builder()
                        .timeout_global(Some(Duration::from_secs(FETCH_TIMEOUT_SECONDS)))
                        .build()
                        .into();
                    agent
                        .get(url.as_str())
                        .call()
                        .and_then(|mut resp| {
                            resp.body_mut()
                                .with_config()
                                .limit(MAX_CORPUS_BYTES)
                                .read_to_string()
                        })
                        .map_err(|e| {
                            DocsError::Load(format!("Failed to fetch corpus from {}: {}", url, e))
                        })
                })
                .await
                .map_err(|e| DocsError::Load(format!("Corpus fetch task failed: {}", e)))?
            }
        }
    }
}

impl fmt::Display for CorpusSource {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

impl CorpusData {
    /// Parse a JSON payload
    #[inline]
    pub fn from_json(json: &str) -> Result<Self, DocsError> {
        serde_json::from_str(json)
            .map_err(|e| DocsError::Load(format!("Failed to parse corpus JSON: {}", e)))
    }

    /// Check the corpus shape.
    ///
    /// All four arrays must be present with equal lengths. Beyond that, every
    /// embedding must have `expected_dimension` finite values and ids must be
    /// unique, so that search never hits a dimension mismatch on stored data.
    #[inline]
    pub fn validate(&self, expected_dimension: usize) -> Result<(), ValidationError> {
        let ids = self
            .ids
            .as_ref()
            .ok_or(ValidationError::MissingField("ids"))?;
        let embeddings = self
            .embeddings
            .as_ref()
            .ok_or(ValidationError::MissingField("embeddings"))?;
        let documents = self
            .documents
            .as_ref()
            .ok_or(ValidationError::MissingField("documents"))?;
        let metadatas = self
            .metadatas
            .as_ref()
            .ok_or(ValidationError::MissingField("metadatas"))?;

        let len = ids.len();
        if embeddings.len() != len || documents.len() != len || metadatas.len() != len {
            return Err(ValidationError::LengthMismatch {
                ids: len,
                embeddings: embeddings.len(),
                documents: documents.len(),
                metadatas: metadatas.len(),
            });
        }

        let mut seen = HashSet::with_capacity(len);
        for (id, embedding) in ids.iter().zip(embeddings) {
            if !seen.insert(id.as_str()) {
                return Err(ValidationError::DuplicateId(id.clone()));
            }
            if embedding.len() != expected_dimension {
                return Err(ValidationError::DimensionMismatch {
                    id: id.clone(),
                    expected: expected_dimension,
                    actual: embedding.len(),
                });
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(ValidationError::NonFiniteValue { id: id.clone() });
            }
        }

        Ok(())
    }

    /// Boolean form of [`CorpusData::validate`]
    #[inline]
    pub fn is_valid(&self, expected_dimension: usize) -> bool {
        self.validate(expected_dimension).is_ok()
    }

    /// Validate and zip the parallel arrays into records, preserving order
    #[inline]
    pub fn into_corpus(self, expected_dimension: usize) -> Result<Corpus, ValidationError> {
        self.validate(expected_dimension)?;

        let records = self
            .ids
            .unwrap_or_default()
            .into_iter()
            .zip(self.embeddings.unwrap_or_default())
            .zip(self.documents.unwrap_or_default())
            .zip(self.metadatas.unwrap_or_default())
            .map(|(((id, embedding), document), metadata)| VectorStoreRecord {
                id,
                embedding,
                document,
                metadata: metadata.unwrap_or_default(),
            })
            .collect();

        Ok(Corpus {
            collection_name: self.collection_name.unwrap_or_default(),
            records,
        })
    }
}
