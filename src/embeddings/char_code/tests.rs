use super::*;

fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

#[test]
fn empty_text_yields_zero_vector() {
    let embedder = CharCodeEmbedder::default();
    let vector = embedder.embed("");

    assert_eq!(vector.len(), DEFAULT_EMBEDDING_DIMENSION);
    assert!(vector.iter().all(|&v| v == 0.0));
}

#[test]
fn whitespace_only_text_yields_zero_vector() {
    let embedder = CharCodeEmbedder::default();
    let vector = embedder.embed(" \t\n  ");

    assert!(vector.iter().all(|&v| v == 0.0));
}

#[test]
fn embedding_is_deterministic() {
    let embedder = CharCodeEmbedder::default();
    let text = "How do I authenticate against the income verification endpoint?";

    assert_eq!(embedder.embed(text), embedder.embed(text));
}

#[test]
fn output_length_is_fixed() {
    let embedder = CharCodeEmbedder::default();
    let long_text = "token ".repeat(500);

    assert_eq!(embedder.embed("a").len(), DEFAULT_EMBEDDING_DIMENSION);
    assert_eq!(embedder.embed(&long_text).len(), DEFAULT_EMBEDDING_DIMENSION);
    assert_eq!(embedder.dimension(), DEFAULT_EMBEDDING_DIMENSION);
}

#[test]
fn nonzero_embedding_is_unit_length() {
    let embedder = CharCodeEmbedder::default();
    let vector = embedder.embed("Create a customer record");

    assert!((magnitude(&vector) - 1.0).abs() < 1e-5);
}

#[test]
fn embedding_is_case_insensitive() {
    let embedder = CharCodeEmbedder::default();

    assert_eq!(embedder.embed("BVN Lookup"), embedder.embed("bvn lookup"));
}

#[test]
fn slots_follow_word_and_character_positions() {
    let embedder = CharCodeEmbedder::new(64);
    // "ab" fills slots 0 and 1, "c" (second word) fills slot 10
    let vector = embedder.embed("ab c");

    let raw = [97.0_f32 / 100.0, 98.0 / 100.0, 99.0 / 100.0];
    let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();

    assert!((vector[0] - raw[0] / norm).abs() < 1e-6);
    assert!((vector[1] - raw[1] / norm).abs() < 1e-6);
    assert!((vector[10] - raw[2] / norm).abs() < 1e-6);
    assert_eq!(vector.iter().filter(|&&v| v != 0.0).count(), 3);
}

#[test]
fn slots_wrap_around_dimension() {
    let embedder = CharCodeEmbedder::new(4);
    // Second word starts at slot 10 % 4 == 2
    let vector = embedder.embed("a b");

    assert!(vector[0] > 0.0);
    assert!(vector[2] > 0.0);
    assert_eq!(vector[1], 0.0);
    assert_eq!(vector[3], 0.0);
}

#[test]
fn non_ascii_input_is_handled() {
    let embedder = CharCodeEmbedder::default();
    let vector = embedder.embed("vérification d'identité 🚀");

    assert_eq!(vector.len(), DEFAULT_EMBEDDING_DIMENSION);
    assert!(vector.iter().all(|v| v.is_finite()));
    assert!((magnitude(&vector) - 1.0).abs() < 1e-5);
}

#[test]
fn zero_dimension_is_clamped() {
    let embedder = CharCodeEmbedder::new(0);

    assert_eq!(embedder.dimension(), 1);
    assert_eq!(embedder.embed("hello").len(), 1);
}
