// Chat-completions verifier for OpenAI-compatible endpoints
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::provider::{VerificationError, VerificationProvider};
use crate::config::VerificationConfig;

pub struct OpenAiVerifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: String,
}

impl OpenAiVerifier {
    /// Build a verifier from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &VerificationConfig) -> Result<Self, VerificationError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| VerificationError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VerificationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key,
        })
    }
}

#[async_trait]
impl VerificationProvider for OpenAiVerifier {
    async fn classify(&self, prompt: &str) -> Result<String, VerificationError> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| VerificationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerificationError::Request(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VerificationError::MalformedResponse(e.to_string()))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                VerificationError::MalformedResponse("missing message content".to_string())
            })
    }
}
