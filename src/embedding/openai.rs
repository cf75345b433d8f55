// HTTP embedding provider for OpenAI-compatible `/embeddings` endpoints
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::provider::{EmbeddingError, EmbeddingProvider};
use crate::config::EmbeddingConfig;

pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
    api_key: String,
}

impl OpenAiEmbeddings {
    /// Build a provider from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| EmbeddingError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Option<Vec<f32>>>, EmbeddingError> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];

        // Blank texts are unembeddable; send only the rest
        let send_indices: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        if send_indices.is_empty() {
            return Ok(results);
        }
        let inputs: Vec<&str> = send_indices.iter().map(|&i| texts[i].as_str()).collect();

        let payload = json!({
            "model": self.model,
            "input": inputs,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Request(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        let data = body
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| EmbeddingError::MalformedResponse("missing data array".to_string()))?;

        for item in data {
            let index = item
                .get("index")
                .and_then(|i| i.as_u64())
                .ok_or_else(|| EmbeddingError::MalformedResponse("missing index".to_string()))?
                as usize;
            let values = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| {
                    EmbeddingError::MalformedResponse("missing embedding array".to_string())
                })?;
            let embedding: Vec<f32> = values
                .iter()
                .filter_map(|v| v.as_f64())
                .map(|v| v as f32)
                .collect();
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
            let position = send_indices.get(index).copied().ok_or_else(|| {
                EmbeddingError::MalformedResponse(format!("embedding index {index} out of range"))
            })?;
            results[position] = Some(embedding);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
