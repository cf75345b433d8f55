// Batching and caching adapter over an embedding provider
use std::sync::Arc;

use ahash::AHashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::provider::EmbeddingProvider;
use crate::cost::CostTracker;

/// Chunks texts into provider-sized batches and caches successful
/// embeddings by exact text for the lifetime of the service.
///
/// Provider failures never abort a run: a failed sub-batch yields `None`
/// for exactly its own texts and the remaining sub-batches still go out.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    cache: Mutex<AHashMap<String, Vec<f32>>>,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            cache: Mutex::new(AHashMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed one text (the hypothesis path).
    pub async fn embed_one(&self, text: &str, usage: &mut CostTracker) -> Option<Vec<f32>> {
        let texts = [text.to_string()];
        self.embed_texts(&texts, usage).await.pop().unwrap_or(None)
    }

    /// Embed many texts, positionally aligned with the input.
    ///
    /// `None` entries are texts that could not be embedded: blank input,
    /// per-text provider nulls, or texts covered by a failed sub-batch.
    pub async fn embed_texts(
        &self,
        texts: &[String],
        usage: &mut CostTracker,
    ) -> Vec<Option<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        // text -> positions waiting on a provider call; first position per
        // text is the one actually sent
        let mut waiting: AHashMap<&str, Vec<usize>> = AHashMap::new();
        let mut pending: Vec<usize> = Vec::new();

        {
            let cache = self.cache.lock().await;
            for (i, text) in texts.iter().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(embedding) = cache.get(text.as_str()) {
                    results[i] = Some(embedding.clone());
                    usage.cache_hits += 1;
                    continue;
                }
                let positions = waiting.entry(text.as_str()).or_default();
                if positions.is_empty() {
                    pending.push(i);
                }
                positions.push(i);
            }
        }

        for chunk in pending.chunks(self.batch_size) {
            let chunk_texts: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            usage.embedding_requests += 1;
            usage.texts_embedded += chunk_texts.len();

            match self.provider.embed_batch(&chunk_texts).await {
                Ok(embeddings) => {
                    let mut cache = self.cache.lock().await;
                    for (text, embedding) in chunk_texts.iter().zip(embeddings) {
                        let positions = match waiting.get(text.as_str()) {
                            Some(positions) => positions,
                            None => continue,
                        };
                        match embedding {
                            Some(vector) => {
                                for &position in positions {
                                    results[position] = Some(vector.clone());
                                }
                                cache.insert(text.clone(), vector);
                            }
                            None => {
                                usage.embedding_failures += 1;
                                debug!(
                                    text_len = text.len(),
                                    "Provider returned no embedding for text"
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    usage.embedding_failures += chunk_texts.len();
                    warn!(
                        error = %e,
                        items = chunk_texts.len(),
                        "Embedding sub-batch failed; its texts stay unembedded"
                    );
                }
            }
        }

        results
    }
}
