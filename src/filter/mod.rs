// Hypothesis-driven relevance filtering
//
// Binary: keep-or-drop with HIGH/MEDIUM/LOW buckets, fails open
// Two-stage: loose embedding gate plus capped LLM verification
// Tiered: four graded relevance bands with per-source weights

mod binary;
mod estimator;
mod keywords;
mod tiered;
mod two_stage;
mod types;

pub use binary::{BinaryFilter, FilterOutcome};
pub use estimator::{
    draw_sample, ConfidenceLevel, ExamplePost, SampleEstimate, SampleEstimator, TierBreakdown,
    WarningLevel,
};
pub use keywords::{extract_keywords, match_keywords};
pub use tiered::{TieredFilter, TieredOutcome};
pub use two_stage::{verification_prompt, TwoStageOutcome, TwoStagePipeline};
pub use types::{
    FilterMetrics, RelevanceTier, ScoredSignal, SignalTier, TieredFilterStats, TieredScoredSignal,
    TieredSignals, TwoStageMetrics, VerifiedSignal,
};

use std::sync::Arc;

use crate::config::FilterConfig;
use crate::embedding::{EmbeddingProvider, EmbeddingService, OpenAiEmbeddings};
use crate::error::Result;
use crate::normalize::NormalizedPost;
use crate::verify::{OpenAiVerifier, VerificationProvider};

/// Which filter a run should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStrategy {
    Binary,
    TwoStage,
    Tiered,
}

impl FilterStrategy {
    pub fn parse_strategy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "binary" => Self::Binary,
            "two_stage" | "two-stage" => Self::TwoStage,
            "tiered" => Self::Tiered,
            _ => Self::Binary, // Default
        }
    }
}

/// Outcome of whichever strategy ran
#[derive(Debug)]
pub enum FilterOutput {
    Binary(FilterOutcome),
    TwoStage(TwoStageOutcome),
    Tiered(TieredOutcome),
}

/// Main filtering entry point
/// Owns the shared embedding service and verification provider and hands
/// out strategy-specific filters built on them.
pub struct SignalFilter {
    embedder: Arc<EmbeddingService>,
    verifier: Arc<dyn VerificationProvider>,
    config: FilterConfig,
}

impl SignalFilter {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        verifier: Arc<dyn VerificationProvider>,
        config: FilterConfig,
    ) -> Self {
        let embedder = Arc::new(EmbeddingService::new(provider, config.embedding.batch_size));
        Self {
            embedder,
            verifier,
            config,
        }
    }

    /// Build a filter wired to the OpenAI-compatible providers named in
    /// the config. Fails when an API key env var is unset.
    pub fn from_config(config: FilterConfig) -> Result<Self> {
        let provider = Arc::new(OpenAiEmbeddings::from_config(&config.embedding)?);
        let verifier = Arc::new(OpenAiVerifier::from_config(&config.verification)?);
        Ok(Self::new(provider, verifier, config))
    }

    pub fn binary(&self) -> BinaryFilter {
        BinaryFilter::new(self.embedder.clone(), self.config.binary)
    }

    pub fn two_stage(&self) -> TwoStagePipeline {
        TwoStagePipeline::new(
            self.embedder.clone(),
            self.verifier.clone(),
            self.config.two_stage.clone(),
            self.config.binary,
        )
    }

    pub fn tiered(&self) -> TieredFilter {
        TieredFilter::new(self.embedder.clone(), self.config.tiered)
    }

    pub fn estimator(&self) -> SampleEstimator {
        SampleEstimator::new(
            self.embedder.clone(),
            self.config.tiered,
            self.config.estimator,
        )
    }

    /// Run the chosen strategy over the posts.
    pub async fn run(
        &self,
        strategy: FilterStrategy,
        posts: &[NormalizedPost],
        hypothesis: &str,
    ) -> FilterOutput {
        match strategy {
            FilterStrategy::Binary => {
                FilterOutput::Binary(self.binary().run(posts, hypothesis).await)
            }
            FilterStrategy::TwoStage => {
                FilterOutput::TwoStage(self.two_stage().run(posts, hypothesis).await)
            }
            FilterStrategy::Tiered => {
                FilterOutput::Tiered(self.tiered().run(posts, hypothesis).await)
            }
        }
    }
}
