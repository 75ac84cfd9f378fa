//! Error types for the research pipeline
//!
//! Only collaborator failures are errors. Model output that fails to parse
//! is not: every parser in [`crate::parse`] degrades to a documented default.

use thiserror::Error;

/// Pipeline error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The text-completion collaborator failed (network, provider, quota).
    #[error("Completion failed: {message}")]
    Completion {
        message: String,
        /// Whether a retry layer may try the call again
        retryable: bool,
    },

    /// The retrieval collaborator failed.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// An executor was built with an unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Transient completion failure (timeouts, rate limits, 5xx).
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
            retryable: true,
        }
    }

    /// Permanent completion failure (bad request, auth, malformed response).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
            retryable: false,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Completion { retryable: true, .. })
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PipelineError>;
