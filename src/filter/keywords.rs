// Hypothesis keyword extraction and matching
//
// Cheap lexical companion to the embedding score: records which hypothesis
// terms literally appear in a post. Diagnostic only, never gates filtering.

use ahash::AHashSet;

/// Words too generic to identify a hypothesis
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do",
    "for", "from", "has", "have", "how", "i", "in", "is", "it", "its",
    "my", "not", "of", "on", "or", "our", "so", "that", "the", "their",
    "they", "this", "to", "want", "we", "what", "when", "which", "who",
    "why", "will", "with", "would", "you", "your",
];

/// Minimum token length worth matching
const MIN_KEYWORD_LEN: usize = 3;

/// Extract matchable keywords from a hypothesis: lowercase alphanumeric
/// tokens with stopwords and short tokens dropped, deduplicated, input
/// order preserved.
pub fn extract_keywords(hypothesis: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut keywords = Vec::new();
    for token in hypothesis.split(|c: char| !c.is_alphanumeric()) {
        let token = token.to_lowercase();
        if token.chars().count() < MIN_KEYWORD_LEN || STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if seen.insert(token.clone()) {
            keywords.push(token);
        }
    }
    keywords
}

/// Which of the keywords appear as whole tokens in the text.
pub fn match_keywords(keywords: &[String], text: &str) -> Vec<String> {
    if keywords.is_empty() {
        return Vec::new();
    }
    let tokens: AHashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .collect();
    keywords
        .iter()
        .filter(|k| tokens.contains(k.as_str()))
        .cloned()
        .collect()
}
