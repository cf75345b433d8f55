// Sample-based relevance estimator
// Scores a small random sample before a full run so a bad hypothesis is
// caught for pennies instead of the full embedding bill.
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{EstimatorConfig, TieredFilterConfig};
use crate::cost::CostTracker;
use crate::embedding::EmbeddingService;
use crate::filter::tiered::TieredFilter;
use crate::filter::types::RelevanceTier;
use crate::normalize::{DataSource, NormalizedPost};

/// How much to trust the predicted percentage. Driven by the absolute
/// number of relevant posts seen, not the percentage itself: 2 of 10 and
/// 8 of 40 are the same rate but very different evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

/// Whether the predicted relevance is low enough to warn about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    StrongWarning,
    Caution,
    None,
}

/// Tier counts over the sampled posts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBreakdown {
    pub core: usize,
    pub strong: usize,
    pub related: usize,
    pub adjacent: usize,
    pub discarded: usize,
}

/// One sampled post surfaced in the estimate, with a plain-language reason
/// for where it landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplePost {
    pub title: String,
    pub source: DataSource,
    pub score: f32,
    pub reason: String,
}

/// Cheap preview of what a full tiered run would find
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleEstimate {
    pub sample_size: usize,
    pub predicted_relevance_percent: f32,
    pub confidence: ConfidenceLevel,
    pub warning: WarningLevel,
    pub tier_breakdown: TierBreakdown,
    pub example_relevant: Vec<ExamplePost>,
    pub example_filtered: Vec<ExamplePost>,
    pub suggestion: Option<String>,
    pub usage: CostTracker,
}

/// Uniform sample without replacement; returns everything when fewer than
/// `amount` posts exist.
pub fn draw_sample<R: Rng + ?Sized>(
    posts: &[NormalizedPost],
    amount: usize,
    rng: &mut R,
) -> Vec<NormalizedPost> {
    posts.choose_multiple(rng, amount).cloned().collect()
}

/// Pre-run relevance estimator
pub struct SampleEstimator {
    tiered: TieredFilter,
    config: EstimatorConfig,
}

impl SampleEstimator {
    pub fn new(
        embedder: Arc<EmbeddingService>,
        tiered: TieredFilterConfig,
        config: EstimatorConfig,
    ) -> Self {
        Self {
            tiered: TieredFilter::new(embedder, tiered),
            config,
        }
    }

    /// Estimate relevance from a random sample of `posts`.
    ///
    /// Fewer than `min_sample` posts short-circuits without spending a
    /// single embedding call; the caller is told to fetch more data first.
    pub async fn estimate(&self, posts: &[NormalizedPost], hypothesis: &str) -> SampleEstimate {
        if posts.len() < self.config.min_sample {
            return self.low_data_estimate(posts.len());
        }

        let sample = {
            let mut rng = rand::thread_rng();
            draw_sample(posts, self.config.max_sample, &mut rng)
        };
        self.estimate_sampled(&sample, hypothesis).await
    }

    /// Estimate from an already-drawn sample.
    pub async fn estimate_sampled(
        &self,
        sample: &[NormalizedPost],
        hypothesis: &str,
    ) -> SampleEstimate {
        let mut usage = CostTracker::new();
        let thresholds = self.tiered.config().thresholds;

        let scores = match self.tiered.score_sample(sample, hypothesis, &mut usage).await {
            Some(scores) => scores,
            None => {
                warn!(
                    run_id = %usage.run_id,
                    "Hypothesis embedding failed; estimate carries no prediction"
                );
                return SampleEstimate {
                    sample_size: sample.len(),
                    predicted_relevance_percent: 0.0,
                    confidence: ConfidenceLevel::VeryLow,
                    warning: WarningLevel::StrongWarning,
                    tier_breakdown: TierBreakdown::default(),
                    example_relevant: Vec::new(),
                    example_filtered: Vec::new(),
                    suggestion: Some(
                        "The hypothesis could not be embedded; check provider access and retry."
                            .to_string(),
                    ),
                    usage,
                };
            }
        };

        let mut breakdown = TierBreakdown::default();
        let mut relevant: Vec<(&NormalizedPost, f32, RelevanceTier)> = Vec::new();
        let mut filtered: Vec<(&NormalizedPost, f32, String)> = Vec::new();
        let mut unembedded: Vec<&NormalizedPost> = Vec::new();

        for (post, score) in sample.iter().zip(scores) {
            let score = match score {
                Some(score) => score,
                None => {
                    unembedded.push(post);
                    continue;
                }
            };

            match RelevanceTier::classify(score, &thresholds) {
                Some(RelevanceTier::Core) => {
                    breakdown.core += 1;
                    relevant.push((post, score, RelevanceTier::Core));
                }
                Some(RelevanceTier::Strong) => {
                    breakdown.strong += 1;
                    relevant.push((post, score, RelevanceTier::Strong));
                }
                Some(RelevanceTier::Related) => {
                    breakdown.related += 1;
                    filtered.push((
                        post,
                        score,
                        format!(
                            "related tier: similarity {score:.2} below strong threshold {:.2}",
                            thresholds.strong
                        ),
                    ));
                }
                Some(RelevanceTier::Adjacent) => {
                    breakdown.adjacent += 1;
                    filtered.push((
                        post,
                        score,
                        format!(
                            "adjacent tier: similarity {score:.2} below related threshold {:.2}",
                            thresholds.related
                        ),
                    ));
                }
                None => {
                    breakdown.discarded += 1;
                    filtered.push((
                        post,
                        score,
                        format!(
                            "similarity {score:.2} below adjacent threshold {:.2}",
                            thresholds.adjacent
                        ),
                    ));
                }
            }
        }

        let relevant_count = breakdown.core + breakdown.strong;
        let percent = if sample.is_empty() {
            0.0
        } else {
            relevant_count as f32 / sample.len() as f32 * 100.0
        };
        let confidence = confidence_for(relevant_count);
        let warning = warning_for(percent);

        relevant.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        filtered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let example_relevant = relevant
            .iter()
            .take(self.config.example_count)
            .map(|(post, score, tier)| ExamplePost {
                title: example_title(post),
                source: post.source,
                score: *score,
                reason: format!("{} relevance (similarity {score:.2})", tier.as_str()),
            })
            .collect();

        let mut example_filtered: Vec<ExamplePost> = filtered
            .iter()
            .take(self.config.example_count)
            .map(|(post, score, reason)| ExamplePost {
                title: example_title(post),
                source: post.source,
                score: *score,
                reason: reason.clone(),
            })
            .collect();
        // Unembedded posts only fill leftover example slots
        for post in unembedded {
            if example_filtered.len() >= self.config.example_count {
                break;
            }
            example_filtered.push(ExamplePost {
                title: example_title(post),
                source: post.source,
                score: 0.0,
                reason: "embedding unavailable".to_string(),
            });
        }

        let suggestion = match warning {
            WarningLevel::StrongWarning => Some(
                "Predicted relevance is very low; reword the hypothesis or add sources before a full run."
                    .to_string(),
            ),
            WarningLevel::Caution => {
                Some("Relevance looks thin; a broader hypothesis or more sources may help.".to_string())
            }
            WarningLevel::None => None,
        };

        info!(
            run_id = %usage.run_id,
            sample = sample.len(),
            relevant = relevant_count,
            predicted_percent = percent,
            "Sample estimate complete"
        );

        SampleEstimate {
            sample_size: sample.len(),
            predicted_relevance_percent: percent,
            confidence,
            warning,
            tier_breakdown: breakdown,
            example_relevant,
            example_filtered,
            suggestion,
            usage,
        }
    }

    fn low_data_estimate(&self, available: usize) -> SampleEstimate {
        warn!(
            available,
            min_sample = self.config.min_sample,
            "Too few posts to estimate; skipping embedding entirely"
        );
        SampleEstimate {
            sample_size: available,
            predicted_relevance_percent: 0.0,
            confidence: ConfidenceLevel::VeryLow,
            warning: WarningLevel::StrongWarning,
            tier_breakdown: TierBreakdown::default(),
            example_relevant: Vec::new(),
            example_filtered: Vec::new(),
            suggestion: Some(format!(
                "Only {available} posts available; fetch at least {} before estimating.",
                self.config.min_sample
            )),
            usage: CostTracker::new(),
        }
    }
}

fn confidence_for(relevant_count: usize) -> ConfidenceLevel {
    if relevant_count < 5 {
        ConfidenceLevel::VeryLow
    } else if relevant_count < 10 {
        ConfidenceLevel::Low
    } else if relevant_count < 20 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    }
}

fn warning_for(percent: f32) -> WarningLevel {
    if percent < 8.0 {
        WarningLevel::StrongWarning
    } else if percent < 20.0 {
        WarningLevel::Caution
    } else {
        WarningLevel::None
    }
}

fn example_title(post: &NormalizedPost) -> String {
    if post.title.trim().is_empty() {
        let mut text = post.text_for_embedding.clone();
        if let Some((idx, _)) = text.char_indices().nth(80) {
            text.truncate(idx);
        }
        text
    } else {
        post.title.clone()
    }
}
