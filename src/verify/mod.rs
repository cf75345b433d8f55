// AI verification of borderline relevance candidates
//
// The expensive half of the two-stage pipeline: a small chat model answers
// YES or NO per candidate. Providers return raw reply text; parsing and
// acceptance policy live here.
mod openai;
mod provider;

pub use openai::OpenAiVerifier;
pub use provider::{VerificationError, VerificationProvider};

use serde::{Deserialize, Serialize};

/// Parsed reply from the verification model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Yes,
    No,
    Maybe,
    /// Reply did not contain a recognizable verdict
    Unknown,
}

impl Verdict {
    /// Parse a raw model reply.
    ///
    /// Models occasionally wrap the verdict in punctuation or markdown; the
    /// first alphabetic token decides, anything else is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let token: String = raw
            .chars()
            .skip_while(|c| !c.is_ascii_alphabetic())
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match token.as_str() {
            "YES" => Self::Yes,
            "NO" => Self::No,
            "MAYBE" => Self::Maybe,
            _ => Self::Unknown,
        }
    }
}

/// How strictly verdicts gate a candidate through verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictMode {
    /// Only an explicit yes passes
    Strict,
    /// Yes or maybe passes
    Lenient,
}

impl VerdictMode {
    pub fn parse_mode(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" => Self::Strict,
            "lenient" => Self::Lenient,
            _ => Self::Strict, // Default
        }
    }

    pub fn accepts(&self, verdict: Verdict) -> bool {
        match self {
            VerdictMode::Strict => verdict == Verdict::Yes,
            VerdictMode::Lenient => matches!(verdict, Verdict::Yes | Verdict::Maybe),
        }
    }
}
