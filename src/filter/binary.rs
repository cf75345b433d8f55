// Binary high/medium/low relevance filter
// One hypothesis embedding plus one similarity score per post; cheap enough
// to run over every fetched post.
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::BinaryFilterConfig;
use crate::cost::CostTracker;
use crate::embedding::{cosine_similarity, EmbeddingService};
use crate::filter::keywords::{extract_keywords, match_keywords};
use crate::filter::types::{FilterMetrics, ScoredSignal, SignalTier};
use crate::normalize::NormalizedPost;

/// Outcome of a binary filter run
#[derive(Debug)]
pub struct FilterOutcome {
    /// Posts that passed (HIGH or MEDIUM), input order preserved
    pub signals: Vec<ScoredSignal>,
    /// Posts that did not pass, kept visible for audit
    pub filtered: Vec<ScoredSignal>,
    pub metrics: FilterMetrics,
    pub usage: CostTracker,
}

/// Keep-or-drop relevance filter
/// Embeds the hypothesis once, scores every post against it, and buckets
/// posts by the two configured thresholds.
pub struct BinaryFilter {
    embedder: Arc<EmbeddingService>,
    config: BinaryFilterConfig,
}

impl BinaryFilter {
    pub fn new(embedder: Arc<EmbeddingService>, config: BinaryFilterConfig) -> Self {
        Self { embedder, config }
    }

    /// Score posts against the hypothesis and split them into passed and
    /// filtered, preserving input order within each list.
    ///
    /// If the hypothesis itself cannot be embedded the filter fails open:
    /// every post passes at MEDIUM, so a provider outage never silently
    /// discards data.
    pub async fn run(&self, posts: &[NormalizedPost], hypothesis: &str) -> FilterOutcome {
        let started = Instant::now();
        let mut usage = CostTracker::new();
        debug!(run_id = %usage.run_id, posts = posts.len(), "Running binary filter");
        let mut metrics = FilterMetrics {
            total_input: posts.len(),
            ..FilterMetrics::default()
        };

        let keywords = extract_keywords(hypothesis);

        let hypothesis_embedding = match self.embedder.embed_one(hypothesis, &mut usage).await {
            Some(embedding) => embedding,
            None => {
                warn!(
                    run_id = %usage.run_id,
                    posts = posts.len(),
                    "Hypothesis embedding failed; failing open, every post passes at MEDIUM"
                );
                return self.fail_open(posts, &keywords, metrics, usage, started);
            }
        };

        let texts: Vec<String> = posts.iter().map(|p| p.text_for_embedding.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts, &mut usage).await;

        let mut signals = Vec::new();
        let mut filtered = Vec::new();

        for (post, embedding) in posts.iter().zip(embeddings) {
            let (score, tier) = match embedding {
                Some(vector) => {
                    let score = cosine_similarity(&hypothesis_embedding, &vector);
                    let tier = SignalTier::classify(
                        score,
                        self.config.high_threshold,
                        self.config.medium_threshold,
                    );
                    (score, tier)
                }
                None => {
                    // Unembeddable posts stay visible in the filtered list
                    metrics.embedding_failures += 1;
                    (0.0, SignalTier::Low)
                }
            };

            let signal = ScoredSignal {
                post: post.clone(),
                embedding_score: score,
                tier,
                passed: tier != SignalTier::Low,
                matched_keywords: match_keywords(&keywords, &post.text_for_embedding),
            };

            match tier {
                SignalTier::High => {
                    metrics.high_count += 1;
                    *metrics.by_source.entry(post.source).or_insert(0) += 1;
                    signals.push(signal);
                }
                SignalTier::Medium => {
                    metrics.medium_count += 1;
                    *metrics.by_source.entry(post.source).or_insert(0) += 1;
                    signals.push(signal);
                }
                SignalTier::Low => {
                    metrics.filtered_count += 1;
                    filtered.push(signal);
                }
            }
        }

        metrics.processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %usage.run_id,
            input = metrics.total_input,
            high = metrics.high_count,
            medium = metrics.medium_count,
            filtered = metrics.filtered_count,
            elapsed_ms = metrics.processing_time_ms,
            "Binary filter complete"
        );

        FilterOutcome {
            signals,
            filtered,
            metrics,
            usage,
        }
    }

    fn fail_open(
        &self,
        posts: &[NormalizedPost],
        keywords: &[String],
        mut metrics: FilterMetrics,
        usage: CostTracker,
        started: Instant,
    ) -> FilterOutcome {
        let signals: Vec<ScoredSignal> = posts
            .iter()
            .map(|post| {
                *metrics.by_source.entry(post.source).or_insert(0) += 1;
                ScoredSignal {
                    post: post.clone(),
                    embedding_score: 0.0,
                    tier: SignalTier::Medium,
                    passed: true,
                    matched_keywords: match_keywords(keywords, &post.text_for_embedding),
                }
            })
            .collect();

        metrics.medium_count = signals.len();
        metrics.hypothesis_fallback = true;
        metrics.processing_time_ms = started.elapsed().as_millis() as u64;

        FilterOutcome {
            signals,
            filtered: Vec::new(),
            metrics,
            usage,
        }
    }
}
