// Embedding provider trait shared by the HTTP implementation and test mocks
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding response malformed: {0}")]
    MalformedResponse(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Trait for embedding providers
///
/// An `Err` means the provider itself failed (network, auth, malformed
/// response) and applies to the whole call. `Ok(None)` for an individual
/// text means that text cannot be embedded (for example blank input) while
/// the rest of the call succeeded.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, positionally aligned with
    /// the input slice.
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Option<Vec<f32>>>, EmbeddingError>;

    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        let texts = [text.to_string()];
        let mut embeddings = self.embed_batch(&texts).await?;
        Ok(embeddings.pop().unwrap_or(None))
    }

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}
