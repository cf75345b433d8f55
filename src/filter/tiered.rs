// Four-tier relevance filter
// Classifies every post into core/strong/related/adjacent bands and weights
// each one by how much its source says about willingness to pay.
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::TieredFilterConfig;
use crate::cost::CostTracker;
use crate::embedding::{cosine_similarity, EmbeddingService};
use crate::filter::types::{RelevanceTier, TieredFilterStats, TieredScoredSignal, TieredSignals};
use crate::normalize::NormalizedPost;

/// Outcome of a tiered filter run
#[derive(Debug)]
pub struct TieredOutcome {
    pub signals: TieredSignals,
    pub stats: TieredFilterStats,
    pub usage: CostTracker,
}

/// Graded relevance filter
/// Unlike the binary filter this one fails closed: with no hypothesis
/// embedding there is no defensible tier assignment, so nothing is kept.
pub struct TieredFilter {
    embedder: Arc<EmbeddingService>,
    config: TieredFilterConfig,
}

impl TieredFilter {
    pub fn new(embedder: Arc<EmbeddingService>, config: TieredFilterConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &TieredFilterConfig {
        &self.config
    }

    /// Similarity score per post, in input order.
    ///
    /// Outer `None` means the hypothesis itself could not be embedded; an
    /// inner `None` marks a single post whose embedding failed. The sample
    /// estimator shares this path so its predictions use the exact scores
    /// a full run would.
    pub(crate) async fn score_sample(
        &self,
        posts: &[NormalizedPost],
        hypothesis: &str,
        usage: &mut CostTracker,
    ) -> Option<Vec<Option<f32>>> {
        let hypothesis_embedding = self.embedder.embed_one(hypothesis, usage).await?;

        let texts: Vec<String> = posts.iter().map(|p| p.text_for_embedding.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts, usage).await;

        Some(
            embeddings
                .into_iter()
                .map(|embedding| {
                    embedding.map(|vector| cosine_similarity(&hypothesis_embedding, &vector))
                })
                .collect(),
        )
    }

    /// Score posts and distribute them across the four relevance tiers,
    /// each tier sorted by descending similarity.
    pub async fn run(&self, posts: &[NormalizedPost], hypothesis: &str) -> TieredOutcome {
        let started = Instant::now();
        let mut usage = CostTracker::new();
        debug!(run_id = %usage.run_id, posts = posts.len(), "Running tiered filter");
        let mut stats = TieredFilterStats {
            total_input: posts.len(),
            ..TieredFilterStats::default()
        };
        let thresholds = self.config.thresholds;

        let scores = match self.score_sample(posts, hypothesis, &mut usage).await {
            Some(scores) => scores,
            None => {
                warn!(
                    run_id = %usage.run_id,
                    posts = posts.len(),
                    "Hypothesis embedding failed; failing closed, no post receives a tier"
                );
                stats.hypothesis_failed = true;
                stats.processing_time_ms = started.elapsed().as_millis() as u64;
                return TieredOutcome {
                    signals: TieredSignals::default(),
                    stats,
                    usage,
                };
            }
        };

        let mut signals = TieredSignals::default();
        for (post, score) in posts.iter().zip(scores) {
            let score = match score {
                Some(score) => score,
                None => {
                    stats.embedding_failures += 1;
                    continue;
                }
            };

            match RelevanceTier::classify(score, &thresholds) {
                Some(tier) => {
                    let weight = self.config.source_weights.for_source(post.source);
                    *stats.by_source.entry(post.source).or_insert(0) += 1;
                    signals.push(TieredScoredSignal {
                        post: post.clone(),
                        score,
                        tier,
                        source_weight: weight.general,
                        wtp_weight: weight.wtp,
                    });
                }
                None => stats.discarded_count += 1,
            }
        }

        sort_by_score_desc(&mut signals.core);
        sort_by_score_desc(&mut signals.strong);
        sort_by_score_desc(&mut signals.related);
        sort_by_score_desc(&mut signals.adjacent);

        stats.core_count = signals.core.len();
        stats.strong_count = signals.strong.len();
        stats.related_count = signals.related.len();
        stats.adjacent_count = signals.adjacent.len();
        stats.processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %usage.run_id,
            input = stats.total_input,
            core = stats.core_count,
            strong = stats.strong_count,
            related = stats.related_count,
            adjacent = stats.adjacent_count,
            discarded = stats.discarded_count,
            elapsed_ms = stats.processing_time_ms,
            "Tiered filter complete"
        );

        TieredOutcome {
            signals,
            stats,
            usage,
        }
    }
}

fn sort_by_score_desc(signals: &mut [TieredScoredSignal]) {
    signals.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
