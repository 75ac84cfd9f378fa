//! LLM Provider trait definition
//!
//! The single text-completion capability the pipelines consume. Implementations
//! bridge to real providers (see [`crate::llm::RigAgentAdapter`]) or wrap another
//! provider to add behavior ([`crate::llm::RetryingProvider`],
//! [`crate::llm::UsageTracker`]).

use std::sync::Arc;

use async_trait::async_trait;

use super::config::{LLMConfig, TokenUsage};
use super::message::Message;
use crate::error::Result;

/// LLM completion response
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    /// Assistant text
    pub content: String,
    /// Token usage statistics (if available from provider)
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Core LLM Provider trait
///
/// Given an ordered conversation, return the assistant text and usage.
/// Fails with [`crate::PipelineError::Completion`] when the upstream call
/// fails. Providers must not retry unless they are explicitly a retry layer.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use research_pipeline::llm::{LLMConfig, LLMProvider, LLMResponse, Message};
///
/// struct Echo;
///
/// #[async_trait]
/// impl LLMProvider for Echo {
///     async fn complete(
///         &self,
///         messages: &[Message],
///         _config: Option<&LLMConfig>,
///     ) -> research_pipeline::Result<LLMResponse> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(LLMResponse::new(last))
///     }
///
///     fn name(&self) -> &str { "echo" }
/// }
/// ```
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion response
    async fn complete(
        &self,
        messages: &[Message],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse>;

    /// Provider name for logging/debugging
    fn name(&self) -> &str;

    /// Default model identifier for this provider
    fn default_model(&self) -> &str {
        "default"
    }
}

#[async_trait]
impl<P: LLMProvider + ?Sized> LLMProvider for Arc<P> {
    async fn complete(
        &self,
        messages: &[Message],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse> {
        self.as_ref().complete(messages, config).await
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn default_model(&self) -> &str {
        self.as_ref().default_model()
    }
}
