// Embeddings module
// Turns free text into fixed-length vectors comparable against the corpus

pub mod char_code;

pub use char_code::{CharCodeEmbedder, DEFAULT_EMBEDDING_DIMENSION};

/// Produces embeddings for query text.
///
/// Implementations must be deterministic and total: the same text always yields
/// the same vector, every call succeeds, and the output length is always
/// [`EmbeddingGenerator::dimension`].
pub trait EmbeddingGenerator: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;

    fn dimension(&self) -> usize;
}
