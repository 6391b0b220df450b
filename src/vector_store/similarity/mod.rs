
use crate::DocsError;

/// Cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]`, or `0.0` when either vector has zero
/// magnitude or contains non-finite values. Vectors of different lengths are rejected with
/// [`DocsError::DimensionMismatch`], reporting `a`'s length as the expected one.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, DocsError> {
    if a.len() != b.len() {
        return Err(DocsError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a_sq, mut norm_b_sq) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot = x.mul_add(y, dot);
        norm_a_sq = x.mul_add(x, norm_a_sq);
        norm_b_sq = y.mul_add(y, norm_b_sq);
    }

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Ok(0.0);
    }

    // Rounding can push identical vectors marginally past 1.0
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}
