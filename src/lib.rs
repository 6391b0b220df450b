use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocsError>;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load vector store: {0}")]
    Load(String),

    #[error("Invalid vector store data: {0}")]
    Validation(#[from] vector_store::ValidationError),

    #[error("Vector store not loaded")]
    NotLoaded,

    #[error("Vector store not yet loaded")]
    StoreNotReady,

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    ModelCall(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod model;
pub mod prompt;
pub mod retrieval;
pub mod vector_store;
