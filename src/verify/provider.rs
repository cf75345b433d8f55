// Verification provider trait for the yes/no relevance check
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Verification request failed: {0}")]
    Request(String),

    #[error("Verification response malformed: {0}")]
    MalformedResponse(String),

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Trait for verification providers
///
/// Takes a fully rendered prompt and returns the model's raw reply text.
/// Verdict parsing stays out of the provider so every backend goes through
/// the same parser.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<String, VerificationError>;
}
