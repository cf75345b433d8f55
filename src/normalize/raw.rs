// Raw records as emitted by the upstream source adapters.
//
// One variant per adapter. Adding a source means adding a variant here plus
// a mapping arm in `normalize`; nothing downstream of normalization changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Un-normalized post as fetched from a source, field names matching what
/// the adapter for that source actually returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    RedditPost {
        id: String,
        subreddit: String,
        author: String,
        title: String,
        /// Reddit's name for the post body
        #[serde(default)]
        selftext: String,
        #[serde(default)]
        upvotes: i64,
        #[serde(default)]
        num_comments: u32,
        created_at: DateTime<Utc>,
    },
    RedditComment {
        id: String,
        subreddit: String,
        author: String,
        body: String,
        #[serde(default)]
        upvotes: i64,
        created_at: DateTime<Utc>,
    },
    AppStoreReview {
        id: String,
        app_name: String,
        title: String,
        body: String,
        rating: u8,
        #[serde(default)]
        country: Option<String>,
        created_at: DateTime<Utc>,
    },
    PlayStoreReview {
        id: String,
        app_name: String,
        /// Play Store reviews frequently omit the title
        #[serde(default)]
        title: Option<String>,
        body: String,
        rating: u8,
        #[serde(default)]
        helpful_count: u32,
        created_at: DateTime<Utc>,
    },
    TrustpilotReview {
        id: String,
        company: String,
        title: String,
        body: String,
        rating: u8,
        #[serde(default)]
        verified_order: bool,
        created_at: DateTime<Utc>,
    },
    G2Review {
        id: String,
        product: String,
        title: String,
        body: String,
        rating: u8,
        #[serde(default)]
        reviewer_role: Option<String>,
        created_at: DateTime<Utc>,
    },
    /// Catch-all for sources without a dedicated adapter (forums, blogs)
    Other {
        id: String,
        source_name: String,
        #[serde(default)]
        title: String,
        body: String,
        #[serde(default)]
        url: Option<String>,
        created_at: DateTime<Utc>,
    },
}

impl RawRecord {
    /// Identifier of the record, unique within its source.
    pub fn id(&self) -> &str {
        match self {
            RawRecord::RedditPost { id, .. }
            | RawRecord::RedditComment { id, .. }
            | RawRecord::AppStoreReview { id, .. }
            | RawRecord::PlayStoreReview { id, .. }
            | RawRecord::TrustpilotReview { id, .. }
            | RawRecord::G2Review { id, .. }
            | RawRecord::Other { id, .. } => id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            RawRecord::RedditPost { created_at, .. }
            | RawRecord::RedditComment { created_at, .. }
            | RawRecord::AppStoreReview { created_at, .. }
            | RawRecord::PlayStoreReview { created_at, .. }
            | RawRecord::TrustpilotReview { created_at, .. }
            | RawRecord::G2Review { created_at, .. }
            | RawRecord::Other { created_at, .. } => *created_at,
        }
    }
}
