// Embedding access for relevance scoring
//
// EmbeddingProvider abstracts over backends, OpenAiEmbeddings talks to
// OpenAI-compatible HTTP endpoints, EmbeddingService adds batching with
// caching and cost accounting. cosine_similarity is the one scoring
// primitive everything downstream shares.

mod openai;
mod provider;
mod service;

pub use openai::OpenAiEmbeddings;
pub use provider::{EmbeddingError, EmbeddingProvider};
pub use service::EmbeddingService;

/// Cosine similarity of two vectors.
///
/// Zero-magnitude or length-mismatched input scores 0.0 instead of NaN so
/// degenerate vectors always land below every relevance threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_one() {
        let v = vec![0.3, 0.5, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_score_negative_one() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_magnitude_scores_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_length_mismatch_scores_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_unit_vector_construction_gives_exact_score() {
        // the mock-embedding scheme used across the integration tests
        let hypothesis = vec![1.0, 0.0];
        let s = 0.42_f32;
        let post = vec![s, (1.0 - s * s).sqrt()];
        assert!((cosine_similarity(&hypothesis, &post) - s).abs() < 1e-6);
    }
}
