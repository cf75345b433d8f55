use crate::config::FilterConfig;
use crate::error::{Result, SignalSiftError, ValidationError};

/// Configuration validator
///
/// Collects every violation in one pass so a broken config file reports all
/// of its problems at once.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &FilterConfig) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_binary(config, &mut errors);
        Self::validate_two_stage(config, &mut errors);
        Self::validate_tiered(config, &mut errors);
        Self::validate_estimator(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_verification(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SignalSiftError::ConfigValidation { errors })
        }
    }

    fn validate_binary(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let binary = &config.binary;
        if !(0.0..=1.0).contains(&binary.high_threshold) {
            errors.push(ValidationError::new(
                "binary.high_threshold",
                format!("Threshold must be within [0, 1], got {}", binary.high_threshold),
            ));
        }
        if !(0.0..=1.0).contains(&binary.medium_threshold) {
            errors.push(ValidationError::new(
                "binary.medium_threshold",
                format!(
                    "Threshold must be within [0, 1], got {}",
                    binary.medium_threshold
                ),
            ));
        }
        if binary.medium_threshold >= binary.high_threshold {
            errors.push(ValidationError::new(
                "binary.medium_threshold",
                format!(
                    "Medium threshold {} must be below high threshold {}",
                    binary.medium_threshold, binary.high_threshold
                ),
            ));
        }
    }

    fn validate_two_stage(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let two_stage = &config.two_stage;
        if !(0.0..=1.0).contains(&two_stage.stage1_threshold) {
            errors.push(ValidationError::new(
                "two_stage.stage1_threshold",
                format!(
                    "Threshold must be within [0, 1], got {}",
                    two_stage.stage1_threshold
                ),
            ));
        }
        if two_stage.verification_cap == 0 {
            errors.push(ValidationError::new(
                "two_stage.verification_cap",
                "Verification cap must be greater than 0",
            ));
        }
        if two_stage.verification_batch_size == 0 {
            errors.push(ValidationError::new(
                "two_stage.verification_batch_size",
                "Batch size must be greater than 0",
            ));
        }
        if two_stage.batch_delay_ms == 0 {
            errors.push(ValidationError::new(
                "two_stage.batch_delay_ms",
                "Batch delay must be greater than 0",
            ));
        }
        let mode = &two_stage.verdict_mode;
        if mode != "strict" && mode != "lenient" {
            errors.push(ValidationError::new(
                "two_stage.verdict_mode",
                format!("Verdict mode must be 'strict' or 'lenient', got '{}'", mode),
            ));
        }
    }

    fn validate_tiered(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let thresholds = &config.tiered.thresholds;
        let ordered = [
            ("core", thresholds.core),
            ("strong", thresholds.strong),
            ("related", thresholds.related),
            ("adjacent", thresholds.adjacent),
        ];

        for (name, value) in ordered {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    format!("tiered.thresholds.{}", name),
                    format!("Threshold must be within [0, 1], got {}", value),
                ));
            }
        }

        for window in ordered.windows(2) {
            let (upper_name, upper) = window[0];
            let (lower_name, lower) = window[1];
            if lower > upper {
                errors.push(ValidationError::new(
                    format!("tiered.thresholds.{}", lower_name),
                    format!(
                        "Tier threshold {} ({}) must not exceed {} ({})",
                        lower_name, lower, upper_name, upper
                    ),
                ));
            }
        }

        if thresholds.adjacent <= 0.0 {
            errors.push(ValidationError::new(
                "tiered.thresholds.adjacent",
                "Adjacent threshold must be greater than 0",
            ));
        }

        let weights = &config.tiered.source_weights;
        let sources = [
            ("reddit", weights.reddit),
            ("appstore", weights.appstore),
            ("playstore", weights.playstore),
            ("trustpilot", weights.trustpilot),
            ("g2", weights.g2),
            ("other", weights.other),
        ];
        for (name, weight) in sources {
            if !(weight.general > 0.0 && weight.general <= 1.0) {
                errors.push(ValidationError::new(
                    format!("tiered.source_weights.{}.general", name),
                    format!("Weight must be within (0, 1], got {}", weight.general),
                ));
            }
            if !(weight.wtp > 0.0 && weight.wtp <= 1.0) {
                errors.push(ValidationError::new(
                    format!("tiered.source_weights.{}.wtp", name),
                    format!("Weight must be within (0, 1], got {}", weight.wtp),
                ));
            }
        }
    }

    fn validate_estimator(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let estimator = &config.estimator;
        if estimator.max_sample == 0 {
            errors.push(ValidationError::new(
                "estimator.max_sample",
                "Sample size must be greater than 0",
            ));
        }
        if estimator.min_sample > estimator.max_sample {
            errors.push(ValidationError::new(
                "estimator.min_sample",
                format!(
                    "Minimum sample {} must not exceed maximum sample {}",
                    estimator.min_sample, estimator.max_sample
                ),
            ));
        }
        if estimator.example_count == 0 {
            errors.push(ValidationError::new(
                "estimator.example_count",
                "Example count must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let embedding = &config.embedding;
        if embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
        if embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Dimension must be greater than 0",
            ));
        }
        if embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
        if embedding.base_url.is_empty() {
            errors.push(ValidationError::new(
                "embedding.base_url",
                "Base URL cannot be empty",
            ));
        }
        if embedding.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "embedding.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_verification(config: &FilterConfig, errors: &mut Vec<ValidationError>) {
        let verification = &config.verification;
        if verification.model.is_empty() {
            errors.push(ValidationError::new(
                "verification.model",
                "Model name cannot be empty",
            ));
        }
        if verification.base_url.is_empty() {
            errors.push(ValidationError::new(
                "verification.base_url",
                "Base URL cannot be empty",
            ));
        }
        let temp = verification.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "verification.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }
        if verification.max_tokens == 0 {
            errors.push(ValidationError::new(
                "verification.max_tokens",
                "Max tokens must be greater than 0",
            ));
        }
        if verification.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "verification.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }
}
