// Integration test for the filtering strategies with realistic post data
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use signalsift::config::{BinaryFilterConfig, TieredFilterConfig};
use signalsift::embedding::{EmbeddingError, EmbeddingProvider, EmbeddingService};
use signalsift::filter::{BinaryFilter, SignalTier, TieredFilter};
use signalsift::normalize::{normalize_batch, DataSource, NormalizedPost, RawRecord};

const HYPOTHESIS: &str = "freelancers waste hours chasing unpaid invoices";

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("signalsift=info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Embeds scripted texts onto unit vectors whose cosine against the
/// hypothesis vector equals the scripted score exactly.
struct ScriptedEmbeddings {
    scores: HashMap<String, f32>,
    fail_hypothesis: bool,
}

impl ScriptedEmbeddings {
    fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(text, score)| (text.to_string(), *score))
                .collect(),
            fail_hypothesis: false,
        }
    }

    fn failing_hypothesis() -> Self {
        Self {
            scores: HashMap::new(),
            fail_hypothesis: true,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                if text == HYPOTHESIS {
                    if self.fail_hypothesis {
                        None
                    } else {
                        Some(vec![1.0, 0.0])
                    }
                } else {
                    self.scores
                        .get(text.as_str())
                        .map(|&s| vec![s, (1.0 - s * s).max(0.0).sqrt()])
                }
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "scripted-2d"
    }
}

fn embedder(scores: &[(&str, f32)]) -> Arc<EmbeddingService> {
    Arc::new(EmbeddingService::new(
        Arc::new(ScriptedEmbeddings::new(scores)),
        32,
    ))
}

fn reddit_record(id: &str, title: &str, selftext: &str) -> RawRecord {
    RawRecord::RedditPost {
        id: id.to_string(),
        subreddit: "freelance".to_string(),
        author: "poster".to_string(),
        title: title.to_string(),
        selftext: selftext.to_string(),
        upvotes: 12,
        num_comments: 4,
        created_at: Utc::now(),
    }
}

fn appstore_record(id: &str, title: &str, body: &str) -> RawRecord {
    RawRecord::AppStoreReview {
        id: id.to_string(),
        app_name: "InvoiceNinja".to_string(),
        title: title.to_string(),
        body: body.to_string(),
        rating: 2,
        country: Some("us".to_string()),
        created_at: Utc::now(),
    }
}

fn make_post(id: &str, source: DataSource, text: &str) -> NormalizedPost {
    use signalsift::normalize::{PostMetadata, SourceDetails};
    let details = match source {
        DataSource::AppStore => SourceDetails::AppStore {
            app_name: "InvoiceNinja".to_string(),
            rating: 2,
            country: None,
        },
        _ => SourceDetails::Reddit {
            subreddit: "freelance".to_string(),
            author: "poster".to_string(),
            upvotes: 12,
            num_comments: 4,
            is_comment: false,
        },
    };
    NormalizedPost {
        id: id.to_string(),
        source,
        title: text.to_string(),
        body: String::new(),
        text_for_embedding: text.to_string(),
        timestamp: Utc::now(),
        metadata: PostMetadata {
            details,
            title_only: true,
            extra: serde_json::Value::Null,
        },
    }
}

#[tokio::test]
async fn test_binary_filter_end_to_end() {
    init_logging();

    // Raw records in, split signals out, with the embedding text built by
    // normalization used as the scoring key
    let records = vec![
        reddit_record(
            "r1",
            "Client is 60 days late on a $4k invoice",
            "I have sent three reminders and am considering a collections agency.",
        ),
        appstore_record(
            "a1",
            "Love the templates",
            "Invoicing used to take me a whole evening, now it is twenty minutes.",
        ),
        reddit_record(
            "r2",
            "What mechanical keyboard do you use",
            "Looking for something quiet for shared office spaces and long typing sessions.",
        ),
    ];
    let posts = normalize_batch(&records);

    let scores: Vec<(String, f32)> = posts
        .iter()
        .zip([0.58f32, 0.41, 0.12])
        .map(|(p, s)| (p.text_for_embedding.clone(), s))
        .collect();
    let score_refs: Vec<(&str, f32)> = scores.iter().map(|(t, s)| (t.as_str(), *s)).collect();

    let filter = BinaryFilter::new(embedder(&score_refs), BinaryFilterConfig::default());
    let outcome = filter.run(&posts, HYPOTHESIS).await;

    println!("Binary filter metrics:");
    println!("  Input: {}", outcome.metrics.total_input);
    println!("  High: {}", outcome.metrics.high_count);
    println!("  Medium: {}", outcome.metrics.medium_count);
    println!("  Filtered: {}", outcome.metrics.filtered_count);
    println!("  Processing time: {}ms", outcome.metrics.processing_time_ms);

    assert_eq!(outcome.metrics.total_input, 3);
    assert_eq!(outcome.signals.len(), 2);
    assert_eq!(outcome.signals[0].post.id, "r1");
    assert_eq!(outcome.signals[0].tier, SignalTier::High);
    assert_eq!(outcome.signals[1].post.id, "a1");
    assert_eq!(outcome.signals[1].tier, SignalTier::Medium);
    assert_eq!(outcome.filtered.len(), 1);
    assert_eq!(outcome.filtered[0].post.id, "r2");

    // Sources tallied for passed posts only
    assert_eq!(outcome.metrics.by_source.get(&DataSource::Reddit), Some(&1));
    assert_eq!(outcome.metrics.by_source.get(&DataSource::AppStore), Some(&1));

    // One request for the hypothesis, one sub-batch for the posts
    assert_eq!(outcome.usage.embedding_requests, 2);
    assert_eq!(outcome.usage.texts_embedded, 4);
}

#[tokio::test]
async fn test_same_input_same_output() {
    let posts = vec![
        make_post("a", DataSource::Reddit, "late invoice rant number one"),
        make_post("b", DataSource::Reddit, "late invoice rant number two"),
        make_post("c", DataSource::Reddit, "completely unrelated post"),
    ];
    let filter = BinaryFilter::new(
        embedder(&[
            ("late invoice rant number one", 0.52),
            ("late invoice rant number two", 0.38),
            ("completely unrelated post", 0.10),
        ]),
        BinaryFilterConfig::default(),
    );

    let first = filter.run(&posts, HYPOTHESIS).await;
    let second = filter.run(&posts, HYPOTHESIS).await;

    let ids = |signals: &[signalsift::filter::ScoredSignal]| {
        signals
            .iter()
            .map(|s| (s.post.id.clone(), s.tier, s.embedding_score))
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first.signals), ids(&second.signals));
    assert_eq!(ids(&first.filtered), ids(&second.filtered));

    // The second run is served from the embedding cache
    assert!(second.usage.cache_hits >= 3);
}

#[tokio::test]
async fn test_raising_threshold_only_shrinks_the_passed_set() {
    let texts: Vec<(String, f32)> = (0..20)
        .map(|i| (format!("post number {i}"), i as f32 * 0.05))
        .collect();
    let score_refs: Vec<(&str, f32)> = texts.iter().map(|(t, s)| (t.as_str(), *s)).collect();
    let posts: Vec<NormalizedPost> = (0..20)
        .map(|i| {
            make_post(
                &format!("p{i}"),
                DataSource::Reddit,
                &format!("post number {i}"),
            )
        })
        .collect();

    let loose = BinaryFilter::new(embedder(&score_refs), BinaryFilterConfig::default());
    let strict = BinaryFilter::new(
        embedder(&score_refs),
        BinaryFilterConfig {
            high_threshold: 0.60,
            medium_threshold: 0.45,
        },
    );

    let loose_outcome = loose.run(&posts, HYPOTHESIS).await;
    let strict_outcome = strict.run(&posts, HYPOTHESIS).await;

    let loose_ids: Vec<&str> = loose_outcome
        .signals
        .iter()
        .map(|s| s.post.id.as_str())
        .collect();
    let strict_ids: Vec<&str> = strict_outcome
        .signals
        .iter()
        .map(|s| s.post.id.as_str())
        .collect();

    println!(
        "Loose passed {} posts, strict passed {}",
        loose_ids.len(),
        strict_ids.len()
    );
    assert!(strict_ids.len() < loose_ids.len());
    // Everything the strict config passes, the loose config passed too
    assert!(strict_ids.iter().all(|id| loose_ids.contains(id)));
}

#[tokio::test]
async fn test_binary_fails_open_where_tiered_fails_closed() {
    let posts = vec![
        make_post("a", DataSource::Reddit, "first post"),
        make_post("b", DataSource::Reddit, "second post"),
    ];

    let binary = BinaryFilter::new(
        Arc::new(EmbeddingService::new(
            Arc::new(ScriptedEmbeddings::failing_hypothesis()),
            32,
        )),
        BinaryFilterConfig::default(),
    );
    let tiered = TieredFilter::new(
        Arc::new(EmbeddingService::new(
            Arc::new(ScriptedEmbeddings::failing_hypothesis()),
            32,
        )),
        TieredFilterConfig::default(),
    );

    let binary_outcome = binary.run(&posts, HYPOTHESIS).await;
    let tiered_outcome = tiered.run(&posts, HYPOTHESIS).await;

    // Binary keeps everything at MEDIUM rather than losing data
    assert_eq!(binary_outcome.signals.len(), 2);
    assert!(binary_outcome.metrics.hypothesis_fallback);
    assert!(binary_outcome
        .signals
        .iter()
        .all(|s| s.tier == SignalTier::Medium && s.passed));

    // Tiered keeps nothing because tier placement would be arbitrary
    assert!(tiered_outcome.signals.is_empty());
    assert!(tiered_outcome.stats.hypothesis_failed);
}

#[tokio::test]
async fn test_tiered_views_and_source_weights() {
    init_logging();

    let filter = TieredFilter::new(
        embedder(&[
            ("invoice chasing ruined my month", 0.63),
            ("payment terms nobody honors", 0.44),
            ("clients ghost after delivery", 0.36),
            ("what do you charge hourly", 0.29),
            ("coworking space recommendations", 0.18),
            ("sourdough photos from the weekend", 0.04),
        ]),
        TieredFilterConfig::default(),
    );
    let posts = vec![
        make_post("core1", DataSource::AppStore, "invoice chasing ruined my month"),
        make_post("core2", DataSource::Reddit, "payment terms nobody honors"),
        make_post("strong1", DataSource::Reddit, "clients ghost after delivery"),
        make_post("related1", DataSource::Reddit, "what do you charge hourly"),
        make_post("adjacent1", DataSource::Reddit, "coworking space recommendations"),
        make_post("noise1", DataSource::Reddit, "sourdough photos from the weekend"),
    ];

    let outcome = filter.run(&posts, HYPOTHESIS).await;

    println!("Tiered stats:");
    println!("  Core: {}", outcome.stats.core_count);
    println!("  Strong: {}", outcome.stats.strong_count);
    println!("  Related: {}", outcome.stats.related_count);
    println!("  Adjacent: {}", outcome.stats.adjacent_count);
    println!("  Discarded: {}", outcome.stats.discarded_count);

    assert_eq!(outcome.stats.core_count, 2);
    assert_eq!(outcome.stats.strong_count, 1);
    assert_eq!(outcome.stats.related_count, 1);
    assert_eq!(outcome.stats.adjacent_count, 1);
    assert_eq!(outcome.stats.discarded_count, 1);

    // Core is sorted by descending similarity
    assert_eq!(outcome.signals.core[0].post.id, "core1");
    assert_eq!(outcome.signals.core[1].post.id, "core2");

    // Deep analysis sees core and strong; competitor extraction adds related
    let deep: Vec<&str> = outcome
        .signals
        .for_deep_analysis()
        .into_iter()
        .map(|s| s.post.id.as_str())
        .collect();
    assert_eq!(deep, vec!["core1", "core2", "strong1"]);
    let competitor: Vec<&str> = outcome
        .signals
        .for_competitor_extraction()
        .into_iter()
        .map(|s| s.post.id.as_str())
        .collect();
    assert_eq!(competitor, vec!["core1", "core2", "strong1", "related1"]);

    // A paid review says more about willingness to pay than a reddit thread
    let appstore = &outcome.signals.core[0];
    let reddit = &outcome.signals.core[1];
    assert!(appstore.wtp_weight > reddit.wtp_weight);
}

#[test]
fn test_normalization_is_stable_across_repeat_runs() {
    let records = vec![
        reddit_record(
            "r1",
            "Spent   all \t morning on \n\n invoices",
            "Three clients, three different portals, zero consistency between them.",
        ),
        appstore_record(
            "a1",
            "Fine app",
            "Does what it says. Syncing could be faster though.",
        ),
    ];

    let first = normalize_batch(&records);
    let second = normalize_batch(&records);

    assert_eq!(first, second);
    // Whitespace runs collapse in the embedding text
    assert!(first[0]
        .text_for_embedding
        .starts_with("Spent all morning on invoices"));
}
