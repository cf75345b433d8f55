//! Normalization of source-specific raw records into one uniform post shape.
//!
//! Every filter downstream consumes [`NormalizedPost`] only; source quirks
//! stop at this boundary. Normalization is pure: no clock or network reads,
//! so the same record always produces the same post.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

mod raw;

pub use raw::RawRecord;

/// Upper bound on the text sent to the embedding provider, in characters.
pub const MAX_EMBEDDING_CHARS: usize = 500;

/// Bodies shorter than this leave the title as the dominant matching signal.
const MIN_BODY_CHARS: usize = 50;

/// Placeholder bodies left behind by moderation or deletion.
const REMOVED_SENTINELS: &[&str] = &["[removed]", "[deleted]"];

/// Where a post came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Reddit,
    AppStore,
    PlayStore,
    Trustpilot,
    G2,
    Other,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Reddit => "reddit",
            DataSource::AppStore => "appstore",
            DataSource::PlayStore => "playstore",
            DataSource::Trustpilot => "trustpilot",
            DataSource::G2 => "g2",
            DataSource::Other => "other",
        }
    }
}

/// Source-specific structure preserved through normalization.
///
/// Strongly typed per source; anything an adapter returns that has no slot
/// here goes into [`PostMetadata::extra`] instead of loosening these types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SourceDetails {
    Reddit {
        subreddit: String,
        author: String,
        upvotes: i64,
        num_comments: u32,
        is_comment: bool,
    },
    AppStore {
        app_name: String,
        rating: u8,
        country: Option<String>,
    },
    PlayStore {
        app_name: String,
        rating: u8,
        helpful_count: u32,
    },
    Trustpilot {
        company: String,
        rating: u8,
        verified_order: bool,
    },
    G2 {
        product: String,
        rating: u8,
        reviewer_role: Option<String>,
    },
    Other {
        source_name: String,
        url: Option<String>,
    },
}

impl SourceDetails {
    pub fn source(&self) -> DataSource {
        match self {
            SourceDetails::Reddit { .. } => DataSource::Reddit,
            SourceDetails::AppStore { .. } => DataSource::AppStore,
            SourceDetails::PlayStore { .. } => DataSource::PlayStore,
            SourceDetails::Trustpilot { .. } => DataSource::Trustpilot,
            SourceDetails::G2 { .. } => DataSource::G2,
            SourceDetails::Other { .. } => DataSource::Other,
        }
    }
}

/// Metadata carried alongside the flattened text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub details: SourceDetails,
    /// True when the body is missing, a moderation sentinel, or too short
    /// to outweigh the title.
    pub title_only: bool,
    /// Escape hatch for adapter fields with no dedicated slot.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

/// A post in the single shape every filter consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    /// Identifier unique within `source`
    pub id: String,
    pub source: DataSource,
    pub title: String,
    pub body: String,
    /// Precomputed bounded text used for similarity scoring
    pub text_for_embedding: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: PostMetadata,
}

/// Flatten one raw record into the uniform post shape.
pub fn normalize(record: &RawRecord) -> NormalizedPost {
    let (source, title, body, details) = match record {
        RawRecord::RedditPost {
            subreddit,
            author,
            title,
            selftext,
            upvotes,
            num_comments,
            ..
        } => (
            DataSource::Reddit,
            title.clone(),
            selftext.clone(),
            SourceDetails::Reddit {
                subreddit: subreddit.clone(),
                author: author.clone(),
                upvotes: *upvotes,
                num_comments: *num_comments,
                is_comment: false,
            },
        ),
        RawRecord::RedditComment {
            subreddit,
            author,
            body,
            upvotes,
            ..
        } => (
            DataSource::Reddit,
            String::new(),
            body.clone(),
            SourceDetails::Reddit {
                subreddit: subreddit.clone(),
                author: author.clone(),
                upvotes: *upvotes,
                num_comments: 0,
                is_comment: true,
            },
        ),
        RawRecord::AppStoreReview {
            app_name,
            title,
            body,
            rating,
            country,
            ..
        } => (
            DataSource::AppStore,
            title.clone(),
            body.clone(),
            SourceDetails::AppStore {
                app_name: app_name.clone(),
                rating: *rating,
                country: country.clone(),
            },
        ),
        RawRecord::PlayStoreReview {
            app_name,
            title,
            body,
            rating,
            helpful_count,
            ..
        } => (
            DataSource::PlayStore,
            title.clone().unwrap_or_default(),
            body.clone(),
            SourceDetails::PlayStore {
                app_name: app_name.clone(),
                rating: *rating,
                helpful_count: *helpful_count,
            },
        ),
        RawRecord::TrustpilotReview {
            company,
            title,
            body,
            rating,
            verified_order,
            ..
        } => (
            DataSource::Trustpilot,
            title.clone(),
            body.clone(),
            SourceDetails::Trustpilot {
                company: company.clone(),
                rating: *rating,
                verified_order: *verified_order,
            },
        ),
        RawRecord::G2Review {
            product,
            title,
            body,
            rating,
            reviewer_role,
            ..
        } => (
            DataSource::G2,
            title.clone(),
            body.clone(),
            SourceDetails::G2 {
                product: product.clone(),
                rating: *rating,
                reviewer_role: reviewer_role.clone(),
            },
        ),
        RawRecord::Other {
            source_name,
            title,
            body,
            url,
            ..
        } => (
            DataSource::Other,
            title.clone(),
            body.clone(),
            SourceDetails::Other {
                source_name: source_name.clone(),
                url: url.clone(),
            },
        ),
    };

    let text_for_embedding = build_embedding_text(&title, &body);
    let title_only = is_title_only(&body);

    NormalizedPost {
        id: record.id().to_string(),
        source,
        title,
        body,
        text_for_embedding,
        timestamp: record.created_at(),
        metadata: PostMetadata {
            details,
            title_only,
            extra: serde_json::Value::Null,
        },
    }
}

/// Normalize a batch, preserving input order.
pub fn normalize_batch(records: &[RawRecord]) -> Vec<NormalizedPost> {
    records.iter().map(normalize).collect()
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Join title and body into the bounded text used for similarity scoring.
fn build_embedding_text(title: &str, body: &str) -> String {
    let joined = format!("{title} {body}");
    let mut text = whitespace().replace_all(joined.trim(), " ").into_owned();
    // Truncate on a char boundary, never mid-codepoint
    if let Some((idx, _)) = text.char_indices().nth(MAX_EMBEDDING_CHARS) {
        text.truncate(idx);
    }
    text
}

/// True when the body carries too little signal to stand on its own.
fn is_title_only(body: &str) -> bool {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    if REMOVED_SENTINELS.contains(&lowered.as_str()) {
        return true;
    }
    trimmed.chars().count() < MIN_BODY_CHARS
}
