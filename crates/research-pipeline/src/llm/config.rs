//! LLM configuration types
//!
//! Provides per-call configuration and usage tracking types for providers.

use serde::{Deserialize, Serialize};

/// Token usage statistics from an LLM completion.
///
/// # Example
///
/// ```
/// use research_pipeline::llm::TokenUsage;
///
/// let usage = TokenUsage::new(100, 50);
/// assert_eq!(usage.total_tokens, 150);
///
/// let total = usage + TokenUsage::new(200, 75);
/// assert_eq!(total.total_tokens, 425);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt
    pub input_tokens: u64,
    /// Number of tokens in the generated output
    pub output_tokens: u64,
    /// Total tokens (input + output)
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a new TokenUsage with calculated total
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input_tokens: input,
            output_tokens: output,
            total_tokens: input + output,
        }
    }

    /// Create from rig-core Usage struct
    pub fn from_rig_usage(usage: &rig::completion::Usage) -> Self {
        Self::new(usage.input_tokens, usage.output_tokens)
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Per-call completion settings.
///
/// ```
/// use research_pipeline::llm::LLMConfig;
///
/// let config = LLMConfig::new("llama3.2")
///     .with_temperature(0.3)
///     .with_max_tokens(1024);
///
/// assert_eq!(config.max_tokens, Some(1024));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LLMConfig {
    /// Model identifier; empty means "provider default"
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub model: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: Option<f64>,
    /// Maximum tokens to generate in the response
    pub max_tokens: Option<u64>,
}

impl LLMConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Settings for a single stage call, leaving the model to the provider.
    pub fn sampling(temperature: f64, max_tokens: u64) -> Self {
        Self::default()
            .with_temperature(temperature)
            .with_max_tokens(max_tokens)
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u64) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_add_assign() {
        let mut usage = TokenUsage::new(100, 50);
        usage += TokenUsage::new(50, 25);

        assert_eq!(usage.input_tokens, 150);
        assert_eq!(usage.output_tokens, 75);
        assert_eq!(usage.total_tokens, 225);
    }

    #[test]
    fn test_sampling_config() {
        let config = LLMConfig::sampling(0.2, 512);

        assert!(config.model.is_empty());
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_tokens, Some(512));
    }

    #[test]
    fn test_llm_config_serialization_skips_empty_model() {
        let json = serde_json::to_string(&LLMConfig::sampling(0.5, 10)).unwrap();
        assert!(!json.contains("model"));
        assert!(json.contains("0.5"));
    }
}
