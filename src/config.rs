//! # Configuration Module
//!
//! Loads CLI configuration from environment variables (and `.env`), then
//! maps it onto the library's `ResearchConfig`, `RagConfig` and
//! `RetryPolicy`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use research_pipeline::{RagConfig, ResearchConfig, RetryPolicy};

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Runtime configuration for the research agent CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// The Ollama model to use (e.g., "llama3.2")
    pub model: String,

    /// Ollama server URL (default: http://localhost:11434)
    pub ollama_host: String,

    /// Sampling temperature for every completion
    pub temperature: f64,

    /// Retrieval hits kept per query
    pub max_search_results: usize,

    /// Iteration cap for the critique-refine loop
    pub max_iterations: usize,

    /// Confidence the critic must report for the loop to stop early
    pub confidence_threshold: f64,

    /// Retries for transient completion failures (0 disables retrying)
    pub llm_max_retries: usize,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
}

// =============================================================================
// DEFAULT IMPLEMENTATION
// =============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            // Low temperature keeps plans and critiques parseable
            temperature: 0.3,
            max_search_results: 5,
            max_iterations: 3,
            confidence_threshold: 0.8,
            llm_max_retries: 3,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
/// Parse `name` from the environment if it is set.
///
/// # Rust Concept: Generic Bounds
///
/// `T: FromStr` accepts any type that can be parsed from a string, and the
/// extra bound on `T::Err` lets `.with_context()` wrap its error.
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", name, val)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Unset variables keep their defaults; set but malformed ones are an
    /// error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Config::default();

        if let Ok(val) = env::var("OLLAMA_MODEL") {
            config.model = val;
        }

        if let Ok(val) = env::var("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }

        if let Some(val) = parse_env("TEMPERATURE")? {
            config.temperature = val;
        }

        if let Some(val) = parse_env("MAX_SEARCH_RESULTS")? {
            config.max_search_results = val;
        }

        if let Some(val) = parse_env("MAX_ITERATIONS")? {
            config.max_iterations = val;
        }

        if let Some(val) = parse_env("CONFIDENCE_THRESHOLD")? {
            config.confidence_threshold = val;
        }

        if let Some(val) = parse_env("LLM_MAX_RETRIES")? {
            config.llm_max_retries = val;
        }

        if let Ok(val) = env::var("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Fail fast here rather than halfway through a run.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.max_iterations == 0 {
            anyhow::bail!("MAX_ITERATIONS must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be between 0.0 and 1.0, got: {}",
                self.confidence_threshold
            );
        }

        if self.model.is_empty() {
            anyhow::bail!("OLLAMA_MODEL cannot be empty");
        }

        Ok(())
    }

    // =========================================================================
    // LIBRARY CONFIGS
    // =========================================================================

    pub fn research_config(&self) -> ResearchConfig {
        ResearchConfig::default().with_temperature(self.temperature)
    }

    pub fn rag_config(&self) -> RagConfig {
        RagConfig::default()
            .with_max_iterations(self.max_iterations)
            .with_confidence_threshold(self.confidence_threshold)
            .with_context_limit(self.max_search_results)
            .with_temperature(self.temperature)
    }

    /// Exponential backoff starting at 500ms, capped at 10s.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.llm_max_retries == 0 {
            return RetryPolicy::none();
        }
        RetryPolicy::exponential(
            self.llm_max_retries,
            Duration::from_millis(500),
            Duration::from_secs(10),
            2.0,
        )
    }
}
