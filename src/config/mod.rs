//! Configuration for the relevance pipeline
//!
//! One serde tree covering every filter plus both providers, loadable from
//! TOML with environment overrides. All thresholds and weights live here so
//! recalibration never touches filter code.

use crate::error::{Result, SignalSiftError};
use crate::normalize::DataSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub binary: BinaryFilterConfig,
    pub two_stage: TwoStageConfig,
    pub tiered: TieredFilterConfig,
    pub estimator: EstimatorConfig,
    pub embedding: EmbeddingConfig,
    pub verification: VerificationConfig,
}

/// Binary high/medium/low filter thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryFilterConfig {
    /// Cosine similarity at or above this is a HIGH signal
    pub high_threshold: f32,
    /// At or above this (and below high) is MEDIUM; below is filtered out
    pub medium_threshold: f32,
}

impl Default for BinaryFilterConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.50,
            medium_threshold: 0.34,
        }
    }
}

/// Two-stage pipeline: loose embedding gate, then capped AI verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoStageConfig {
    /// Stage-1 gate, deliberately looser than the binary medium threshold
    pub stage1_threshold: f32,
    /// Hard ceiling on candidates sent to verification per run
    pub verification_cap: usize,
    /// Candidates verified concurrently within one batch
    pub verification_batch_size: usize,
    /// Pause between verification batch starts
    pub batch_delay_ms: u64,
    /// "strict" (yes only) or "lenient" (yes or maybe)
    pub verdict_mode: String,
}

impl Default for TwoStageConfig {
    fn default() -> Self {
        Self {
            stage1_threshold: 0.28,
            verification_cap: 50,
            verification_batch_size: 10,
            batch_delay_ms: 1500,
            verdict_mode: "strict".to_string(),
        }
    }
}

/// Graduated relevance tier thresholds, ordered core through adjacent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub core: f32,
    pub strong: f32,
    pub related: f32,
    pub adjacent: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            core: 0.40,
            strong: 0.35,
            related: 0.25,
            adjacent: 0.15,
        }
    }
}

/// Weight pair applied to every retained tiered signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceWeight {
    /// General credibility of the source
    pub general: f32,
    /// How strongly the source signals willingness to pay
    pub wtp: f32,
}

/// Per-source weight table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeightsConfig {
    pub reddit: SourceWeight,
    pub appstore: SourceWeight,
    pub playstore: SourceWeight,
    pub trustpilot: SourceWeight,
    pub g2: SourceWeight,
    pub other: SourceWeight,
}

impl SourceWeightsConfig {
    pub fn for_source(&self, source: DataSource) -> SourceWeight {
        match source {
            DataSource::Reddit => self.reddit,
            DataSource::AppStore => self.appstore,
            DataSource::PlayStore => self.playstore,
            DataSource::Trustpilot => self.trustpilot,
            DataSource::G2 => self.g2,
            DataSource::Other => self.other,
        }
    }
}

impl Default for SourceWeightsConfig {
    fn default() -> Self {
        // Paid review platforms signal purchase intent far more reliably
        // than reddit chatter, hence the wide wtp spread
        Self {
            reddit: SourceWeight {
                general: 0.6,
                wtp: 0.3,
            },
            appstore: SourceWeight {
                general: 1.0,
                wtp: 0.9,
            },
            playstore: SourceWeight {
                general: 0.95,
                wtp: 0.9,
            },
            trustpilot: SourceWeight {
                general: 0.9,
                wtp: 0.8,
            },
            g2: SourceWeight {
                general: 0.9,
                wtp: 0.85,
            },
            other: SourceWeight {
                general: 0.5,
                wtp: 0.4,
            },
        }
    }
}

/// Graduated four-tier filter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredFilterConfig {
    pub thresholds: TierThresholds,
    pub source_weights: SourceWeightsConfig,
}

/// Pre-flight sample estimator
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Most posts scored during estimation
    pub max_sample: usize,
    /// Below this many available posts estimation refuses to predict
    pub min_sample: usize,
    /// Example posts surfaced per bucket
    pub example_count: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_sample: 40,
            min_sample: 10,
            example_count: 3,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    /// Texts per provider request
    pub batch_size: usize,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 32,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Verification provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    /// A verdict is one word; anything longer is wasted spend
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: 8,
            timeout_secs: 30,
        }
    }
}

impl FilterConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SignalSiftError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SignalSiftError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: FilterConfig = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SignalSiftError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: SIGNALSIFT_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("SIGNALSIFT_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        // Simple implementation for common overrides
        match path {
            "BINARY__HIGH_THRESHOLD" => {
                self.binary.high_threshold = parse_env_value(path, value, "number")?;
            }
            "BINARY__MEDIUM_THRESHOLD" => {
                self.binary.medium_threshold = parse_env_value(path, value, "number")?;
            }
            "TWO_STAGE__STAGE1_THRESHOLD" => {
                self.two_stage.stage1_threshold = parse_env_value(path, value, "number")?;
            }
            "TWO_STAGE__VERIFICATION_CAP" => {
                self.two_stage.verification_cap = parse_env_value(path, value, "integer")?;
            }
            "TWO_STAGE__VERDICT_MODE" => {
                self.two_stage.verdict_mode = value.to_string();
            }
            "TIERED__CORE_THRESHOLD" => {
                self.tiered.thresholds.core = parse_env_value(path, value, "number")?;
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "EMBEDDING__BASE_URL" => {
                self.embedding.base_url = value.to_string();
            }
            "EMBEDDING__API_KEY_ENV" => {
                self.embedding.api_key_env = value.to_string();
            }
            "VERIFICATION__MODEL" => {
                self.verification.model = value.to_string();
            }
            "VERIFICATION__API_KEY_ENV" => {
                self.verification.api_key_env = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }
}

fn parse_env_value<T: std::str::FromStr>(path: &str, value: &str, kind: &str) -> Result<T> {
    value.parse().map_err(|_| SignalSiftError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}' as {}", value, kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_calibrated_thresholds() {
        let config = FilterConfig::default();
        assert_eq!(config.binary.high_threshold, 0.50);
        assert_eq!(config.binary.medium_threshold, 0.34);
        assert_eq!(config.two_stage.stage1_threshold, 0.28);
        assert_eq!(config.two_stage.verification_cap, 50);
        assert_eq!(config.two_stage.verification_batch_size, 10);
        assert_eq!(config.two_stage.batch_delay_ms, 1500);
        assert_eq!(config.tiered.thresholds.core, 0.40);
        assert_eq!(config.tiered.thresholds.adjacent, 0.15);
        assert_eq!(config.estimator.max_sample, 40);
        assert_eq!(config.estimator.min_sample, 10);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signalsift.toml");

        let mut config = FilterConfig::default();
        config.two_stage.verification_cap = 25;
        config.tiered.thresholds.related = 0.22;
        config.save(&path).unwrap();

        // parse the file directly so this test is immune to env overrides
        // applied elsewhere in the suite
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: FilterConfig = toml::from_str(&content).unwrap();
        assert_eq!(loaded.two_stage.verification_cap, 25);
        assert_eq!(loaded.tiered.thresholds.related, 0.22);
        assert_eq!(loaded.tiered.source_weights.reddit.wtp, 0.3);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let content = r#"
            [binary]
            medium_threshold = 0.4

            [tiered.source_weights.reddit]
            general = 0.7
            wtp = 0.35
        "#;
        let config: FilterConfig = toml::from_str(content).unwrap();
        assert_eq!(config.binary.medium_threshold, 0.4);
        // untouched keys keep their defaults
        assert_eq!(config.binary.high_threshold, 0.50);
        assert_eq!(config.tiered.source_weights.reddit.general, 0.7);
        assert_eq!(config.tiered.source_weights.appstore.general, 1.0);
        assert_eq!(config.two_stage.verification_cap, 50);
    }

    #[test]
    fn test_env_override_applies_and_reports_garbage() {
        std::env::set_var("SIGNALSIFT_TWO_STAGE__VERIFICATION_CAP", "75");
        let mut config = FilterConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.two_stage.verification_cap, 75);
        std::env::remove_var("SIGNALSIFT_TWO_STAGE__VERIFICATION_CAP");

        let mut config = FilterConfig::default();
        let result = config.set_value_from_env("BINARY__MEDIUM_THRESHOLD", "not-a-number");
        assert!(matches!(
            result,
            Err(SignalSiftError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_weight_lookup_by_source() {
        let weights = SourceWeightsConfig::default();
        assert_eq!(weights.for_source(DataSource::AppStore).general, 1.0);
        assert_eq!(weights.for_source(DataSource::Reddit).wtp, 0.3);
        assert!(
            weights.for_source(DataSource::AppStore).wtp > weights.for_source(DataSource::Reddit).wtp
        );
    }
}
