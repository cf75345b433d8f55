// Shared types for the relevance filters
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::TierThresholds;
use crate::normalize::{DataSource, NormalizedPost};

/// Coarse relevance bucket from the binary filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalTier {
    High,
    Medium,
    Low,
}

impl SignalTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTier::High => "HIGH",
            SignalTier::Medium => "MEDIUM",
            SignalTier::Low => "LOW",
        }
    }

    /// Classify a similarity score against the two binary thresholds.
    /// Both boundaries are inclusive on the way up.
    pub fn classify(score: f32, high: f32, medium: f32) -> Self {
        if score >= high {
            SignalTier::High
        } else if score >= medium {
            SignalTier::Medium
        } else {
            SignalTier::Low
        }
    }
}

/// Post scored by the binary filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSignal {
    pub post: NormalizedPost,
    /// Cosine similarity against the hypothesis, 0.0 when unembeddable
    pub embedding_score: f32,
    pub tier: SignalTier,
    /// Whether the post survives the filter (tier above LOW)
    pub passed: bool,
    /// Hypothesis keywords found in the post text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

/// Candidate after AI verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedSignal {
    pub signal: ScoredSignal,
    /// Whether the verdict accepted the candidate under the active mode
    pub verified: bool,
    /// Raw model reply, or the error text when the request failed
    pub verdict_raw: String,
}

/// Graduated relevance tier. Declaration order is most to least relevant,
/// so the derived ordering sorts core first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceTier {
    Core,
    Strong,
    Related,
    Adjacent,
}

impl RelevanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelevanceTier::Core => "core",
            RelevanceTier::Strong => "strong",
            RelevanceTier::Related => "related",
            RelevanceTier::Adjacent => "adjacent",
        }
    }

    /// Classify a score against the tier thresholds. `None` means below the
    /// adjacent floor; such posts are discarded, never retained at zero tier.
    pub fn classify(score: f32, thresholds: &TierThresholds) -> Option<Self> {
        if score >= thresholds.core {
            Some(RelevanceTier::Core)
        } else if score >= thresholds.strong {
            Some(RelevanceTier::Strong)
        } else if score >= thresholds.related {
            Some(RelevanceTier::Related)
        } else if score >= thresholds.adjacent {
            Some(RelevanceTier::Adjacent)
        } else {
            None
        }
    }
}

/// Post retained by the tiered filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredScoredSignal {
    pub post: NormalizedPost,
    pub score: f32,
    pub tier: RelevanceTier,
    /// General credibility weight of the post's source
    pub source_weight: f32,
    /// Willingness-to-pay weight of the post's source
    pub wtp_weight: f32,
}

/// Retained signals grouped by tier, each tier sorted by score descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TieredSignals {
    pub core: Vec<TieredScoredSignal>,
    pub strong: Vec<TieredScoredSignal>,
    pub related: Vec<TieredScoredSignal>,
    pub adjacent: Vec<TieredScoredSignal>,
}

impl TieredSignals {
    pub fn push(&mut self, signal: TieredScoredSignal) {
        match signal.tier {
            RelevanceTier::Core => self.core.push(signal),
            RelevanceTier::Strong => self.strong.push(signal),
            RelevanceTier::Related => self.related.push(signal),
            RelevanceTier::Adjacent => self.adjacent.push(signal),
        }
    }

    /// Signals worth full deep analysis: core and strong.
    pub fn for_deep_analysis(&self) -> Vec<&TieredScoredSignal> {
        self.core.iter().chain(self.strong.iter()).collect()
    }

    /// Signals worth scanning for competitor mentions: core, strong, related.
    pub fn for_competitor_extraction(&self) -> Vec<&TieredScoredSignal> {
        self.core
            .iter()
            .chain(self.strong.iter())
            .chain(self.related.iter())
            .collect()
    }

    /// Every retained signal, most relevant tier first.
    pub fn all(&self) -> Vec<&TieredScoredSignal> {
        self.core
            .iter()
            .chain(self.strong.iter())
            .chain(self.related.iter())
            .chain(self.adjacent.iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.strong.len() + self.related.len() + self.adjacent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Statistics from a binary filter run
#[derive(Debug, Clone, Default)]
pub struct FilterMetrics {
    pub total_input: usize,
    pub high_count: usize,
    pub medium_count: usize,
    /// Posts below the medium threshold or unembeddable
    pub filtered_count: usize,
    pub embedding_failures: usize,
    /// True when the hypothesis could not be embedded and every post passed
    pub hypothesis_fallback: bool,
    /// Passed signals per source
    pub by_source: HashMap<DataSource, usize>,
    pub processing_time_ms: u64,
}

/// Statistics from a tiered filter run
#[derive(Debug, Clone, Default)]
pub struct TieredFilterStats {
    pub total_input: usize,
    pub core_count: usize,
    pub strong_count: usize,
    pub related_count: usize,
    pub adjacent_count: usize,
    /// Scored below the adjacent floor and dropped
    pub discarded_count: usize,
    pub embedding_failures: usize,
    /// True when the hypothesis could not be embedded and nothing was retained
    pub hypothesis_failed: bool,
    /// Retained signals per source
    pub by_source: HashMap<DataSource, usize>,
    pub processing_time_ms: u64,
}

/// Statistics from a two-stage pipeline run
#[derive(Debug, Clone, Default)]
pub struct TwoStageMetrics {
    pub total_input: usize,
    /// Posts over the loose stage-1 threshold
    pub stage1_candidates: usize,
    /// Candidates actually sent to verification, after the cap
    pub stage2_selected: usize,
    pub verified_count: usize,
    pub unverified_count: usize,
    pub verification_errors: usize,
    pub verification_batches: usize,
    /// verified / stage2_selected, 0.0 when nothing was selected
    pub verification_rate: f32,
    pub hypothesis_fallback: bool,
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{PostMetadata, SourceDetails};
    use chrono::Utc;

    fn make_post(id: &str) -> NormalizedPost {
        NormalizedPost {
            id: id.to_string(),
            source: DataSource::Other,
            title: "title".to_string(),
            body: "body".to_string(),
            text_for_embedding: "title body".to_string(),
            timestamp: Utc::now(),
            metadata: PostMetadata {
                details: SourceDetails::Other {
                    source_name: "forum".to_string(),
                    url: None,
                },
                title_only: false,
                extra: serde_json::Value::Null,
            },
        }
    }

    fn make_tiered(id: &str, tier: RelevanceTier, score: f32) -> TieredScoredSignal {
        TieredScoredSignal {
            post: make_post(id),
            score,
            tier,
            source_weight: 0.5,
            wtp_weight: 0.4,
        }
    }

    #[test]
    fn test_signal_tier_boundaries_are_inclusive() {
        assert_eq!(SignalTier::classify(0.50, 0.50, 0.34), SignalTier::High);
        assert_eq!(SignalTier::classify(0.49, 0.50, 0.34), SignalTier::Medium);
        assert_eq!(SignalTier::classify(0.34, 0.50, 0.34), SignalTier::Medium);
        assert_eq!(SignalTier::classify(0.339, 0.50, 0.34), SignalTier::Low);
        assert_eq!(SignalTier::classify(-0.2, 0.50, 0.34), SignalTier::Low);
    }

    #[test]
    fn test_raising_threshold_only_demotes() {
        // a post passing at a higher medium threshold must pass at a lower one
        let mut score = -1.0_f32;
        while score <= 1.0 {
            let loose = SignalTier::classify(score, 0.50, 0.28);
            let tight = SignalTier::classify(score, 0.50, 0.40);
            if tight != SignalTier::Low {
                assert_ne!(loose, SignalTier::Low, "score {} demoted by loosening", score);
            }
            score += 0.01;
        }
    }

    #[test]
    fn test_relevance_tier_boundaries() {
        let thresholds = TierThresholds::default();
        assert_eq!(
            RelevanceTier::classify(0.40, &thresholds),
            Some(RelevanceTier::Core)
        );
        assert_eq!(
            RelevanceTier::classify(0.39, &thresholds),
            Some(RelevanceTier::Strong)
        );
        assert_eq!(
            RelevanceTier::classify(0.25, &thresholds),
            Some(RelevanceTier::Related)
        );
        assert_eq!(
            RelevanceTier::classify(0.15, &thresholds),
            Some(RelevanceTier::Adjacent)
        );
        assert_eq!(RelevanceTier::classify(0.149, &thresholds), None);
    }

    #[test]
    fn test_core_sorts_before_adjacent() {
        assert!(RelevanceTier::Core < RelevanceTier::Strong);
        assert!(RelevanceTier::Related < RelevanceTier::Adjacent);
    }

    #[test]
    fn test_tiered_views() {
        let mut signals = TieredSignals::default();
        signals.push(make_tiered("c1", RelevanceTier::Core, 0.6));
        signals.push(make_tiered("s1", RelevanceTier::Strong, 0.37));
        signals.push(make_tiered("r1", RelevanceTier::Related, 0.3));
        signals.push(make_tiered("a1", RelevanceTier::Adjacent, 0.2));

        assert_eq!(signals.len(), 4);
        assert_eq!(signals.for_deep_analysis().len(), 2);
        assert_eq!(signals.for_competitor_extraction().len(), 3);

        let ids: Vec<&str> = signals.all().iter().map(|s| s.post.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "s1", "r1", "a1"]);
    }

    #[test]
    fn test_tier_serialization_names() {
        assert_eq!(serde_json::to_string(&SignalTier::High).unwrap(), "\"HIGH\"");
        assert_eq!(
            serde_json::to_string(&RelevanceTier::Core).unwrap(),
            "\"core\""
        );
    }
}
