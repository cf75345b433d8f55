// Two-stage filter pipeline
// A loose embedding pass proposes candidates, a capped LLM pass verifies
// them. The cap and batch pacing keep verification spend bounded.
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{BinaryFilterConfig, TwoStageConfig};
use crate::cost::CostTracker;
use crate::embedding::EmbeddingService;
use crate::filter::binary::BinaryFilter;
use crate::filter::types::{ScoredSignal, TwoStageMetrics, VerifiedSignal};
use crate::normalize::NormalizedPost;
use crate::verify::{Verdict, VerdictMode, VerificationProvider};

/// Instructions sent ahead of every verification question. The model must
/// answer with a single word so verdict parsing stays trivial.
const VERIFICATION_INSTRUCTIONS: &str = "You are screening user posts for a product research \
pipeline. Decide whether the post below specifically supports the hypothesis, not whether it \
is merely on an adjacent topic. Respond with exactly one word: YES if the post specifically \
supports the hypothesis, NO if it does not. If you are genuinely unsure, respond MAYBE.";

/// Full prompt for one candidate post.
pub fn verification_prompt(hypothesis: &str, post: &NormalizedPost) -> String {
    format!(
        "{VERIFICATION_INSTRUCTIONS}\n\nHypothesis: {hypothesis}\n\nPost (from {source}):\n{text}",
        source = post.source.as_str(),
        text = post.text_for_embedding,
    )
}

/// Outcome of a two-stage run
#[derive(Debug)]
pub struct TwoStageOutcome {
    /// Candidates the verifier accepted, in verification order
    pub verified: Vec<VerifiedSignal>,
    /// Candidates the verifier rejected or failed on
    pub unverified: Vec<VerifiedSignal>,
    pub metrics: TwoStageMetrics,
    pub usage: CostTracker,
}

/// Embedding prefilter plus LLM verification
pub struct TwoStagePipeline {
    embedder: Arc<EmbeddingService>,
    verifier: Arc<dyn VerificationProvider>,
    config: TwoStageConfig,
    binary: BinaryFilterConfig,
}

impl TwoStagePipeline {
    pub fn new(
        embedder: Arc<EmbeddingService>,
        verifier: Arc<dyn VerificationProvider>,
        config: TwoStageConfig,
        binary: BinaryFilterConfig,
    ) -> Self {
        Self {
            embedder,
            verifier,
            config,
            binary,
        }
    }

    /// Run both stages.
    ///
    /// Stage one reuses the binary filter with its medium threshold lowered
    /// to `stage1_threshold`, so borderline posts survive into verification.
    /// Stage two ranks the survivors by similarity, keeps at most
    /// `verification_cap`, and asks the verifier about each one in paced
    /// concurrent batches. A failed verification call marks that post
    /// unverified; it never aborts the batch.
    pub async fn run(&self, posts: &[NormalizedPost], hypothesis: &str) -> TwoStageOutcome {
        let started = Instant::now();
        let mut usage = CostTracker::new();
        debug!(run_id = %usage.run_id, posts = posts.len(), "Running two-stage pipeline");
        let mode = VerdictMode::parse_mode(&self.config.verdict_mode);

        // Stage 1: loose embedding gate
        let prefilter = BinaryFilter::new(
            self.embedder.clone(),
            BinaryFilterConfig {
                high_threshold: self.binary.high_threshold,
                medium_threshold: self.config.stage1_threshold,
            },
        );
        let stage1 = prefilter.run(posts, hypothesis).await;
        usage.merge(&stage1.usage);

        let mut metrics = TwoStageMetrics {
            total_input: posts.len(),
            stage1_candidates: stage1.signals.len(),
            hypothesis_fallback: stage1.metrics.hypothesis_fallback,
            ..TwoStageMetrics::default()
        };

        // Stage 2: rank and cap
        let mut capped = stage1.signals;
        capped.sort_by(|a, b| {
            b.embedding_score
                .partial_cmp(&a.embedding_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        capped.truncate(self.config.verification_cap);
        metrics.stage2_selected = capped.len();

        // Stage 3: paced verification batches
        let batch_size = self.config.verification_batch_size.max(1);
        let mut verified = Vec::new();
        let mut unverified = Vec::new();
        let mut batch_index = 0;

        while !capped.is_empty() {
            if batch_index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }

            let take = batch_size.min(capped.len());
            let batch: Vec<ScoredSignal> = capped.drain(..take).collect();
            let prompts: Vec<String> = batch
                .iter()
                .map(|signal| verification_prompt(hypothesis, &signal.post))
                .collect();

            debug!(
                run_id = %usage.run_id,
                batch = batch_index,
                size = batch.len(),
                "Verifying candidate batch"
            );
            usage.verification_requests += prompts.len();
            let replies = join_all(prompts.iter().map(|p| self.verifier.classify(p))).await;

            for (signal, reply) in batch.into_iter().zip(replies) {
                match reply {
                    Ok(raw) => {
                        let accepted = mode.accepts(Verdict::parse(&raw));
                        let result = VerifiedSignal {
                            signal,
                            verified: accepted,
                            verdict_raw: raw,
                        };
                        if accepted {
                            metrics.verified_count += 1;
                            verified.push(result);
                        } else {
                            metrics.unverified_count += 1;
                            unverified.push(result);
                        }
                    }
                    Err(e) => {
                        // Fail closed for this post only; the raw error text
                        // is kept where the verdict would have been
                        usage.verification_failures += 1;
                        metrics.verification_errors += 1;
                        metrics.unverified_count += 1;
                        warn!(
                            post_id = %signal.post.id,
                            error = %e,
                            "Verification call failed; treating post as unverified"
                        );
                        unverified.push(VerifiedSignal {
                            signal,
                            verified: false,
                            verdict_raw: e.to_string(),
                        });
                    }
                }
            }

            batch_index += 1;
        }

        metrics.verification_batches = batch_index;
        metrics.verification_rate = if metrics.stage2_selected > 0 {
            metrics.verified_count as f32 / metrics.stage2_selected as f32
        } else {
            0.0
        };
        metrics.processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %usage.run_id,
            input = metrics.total_input,
            stage1 = metrics.stage1_candidates,
            stage2 = metrics.stage2_selected,
            verified = metrics.verified_count,
            errors = metrics.verification_errors,
            batches = metrics.verification_batches,
            elapsed_ms = metrics.processing_time_ms,
            "Two-stage filter complete"
        );

        TwoStageOutcome {
            verified,
            unverified,
            metrics,
            usage,
        }
    }
}
