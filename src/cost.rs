use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running tally of paid provider usage for a single filter run.
///
/// Each filter entry point creates one tracker, threads it through every
/// provider call it makes, and returns it inside the outcome so callers can
/// account for spend. Nested stages merge their child trackers upward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTracker {
    /// Identifier for the run this tally belongs to
    pub run_id: Uuid,
    /// Number of embedding API requests issued (one per sub-batch)
    pub embedding_requests: usize,
    /// Number of texts sent to the embedding provider
    pub texts_embedded: usize,
    /// Number of texts that came back without an embedding
    pub embedding_failures: usize,
    /// Number of texts served from the in-process cache
    pub cache_hits: usize,
    /// Number of verification API requests issued (one per candidate)
    pub verification_requests: usize,
    /// Number of verification requests that failed
    pub verification_failures: usize,
}

impl CostTracker {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            embedding_requests: 0,
            texts_embedded: 0,
            embedding_failures: 0,
            cache_hits: 0,
            verification_requests: 0,
            verification_failures: 0,
        }
    }

    /// Fold a child tracker into this one, keeping this tracker's run id.
    pub fn merge(&mut self, other: &CostTracker) {
        self.embedding_requests += other.embedding_requests;
        self.texts_embedded += other.texts_embedded;
        self.embedding_failures += other.embedding_failures;
        self.cache_hits += other.cache_hits;
        self.verification_requests += other.verification_requests;
        self.verification_failures += other.verification_failures;
    }

    /// Total paid API requests across both providers.
    pub fn total_requests(&self) -> usize {
        self.embedding_requests + self.verification_requests
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new()
    }
}
