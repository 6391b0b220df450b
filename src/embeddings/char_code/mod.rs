#[cfg(test)]
mod tests;

use tracing::debug;

use super::EmbeddingGenerator;

/// Dimension of the precomputed corpus embeddings (all-MiniLM-L6-v2 sized)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Slot stride between consecutive words
const WORD_STRIDE: usize = 10;
const CHAR_CODE_SCALE: f32 = 100.0;

/// Placeholder embedder that spreads character codes across the vector.
///
/// Vectors are only consistent with each other. They carry no semantic
/// meaning, so a real embedding model should replace this generator
/// before the assistant is trusted with ranking quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCodeEmbedder {
    dimension: usize,
}

impl CharCodeEmbedder {
    /// Create an embedder producing vectors of `dimension` floats.
    ///
    /// A zero dimension is clamped to one so that slot assignment stays total.
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for CharCodeEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl EmbeddingGenerator for CharCodeEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();

        for (word_index, word) in lowered.split_whitespace().enumerate() {
            // UTF-16 code units, so non-BMP characters occupy two positions
            for (char_index, code) in word.encode_utf16().enumerate() {
                let slot = word_index
                    .wrapping_mul(WORD_STRIDE)
                    .wrapping_add(char_index)
                    % self.dimension;
                vector[slot] += f32::from(code) / CHAR_CODE_SCALE;
            }
        }

        normalize(&mut vector);

        debug!(
            "Embedded text (length: {}) into {} dimensions",
            text.len(),
            self.dimension
        );
        vector
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// L2-normalize in place. A zero vector is left untouched.
fn normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}
