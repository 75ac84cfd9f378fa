//! Token usage ledger
//!
//! An injected decorator that sums the usage reported by every completion,
//! so runs can report token totals without a process-wide logger.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::config::{LLMConfig, TokenUsage};
use super::message::Message;
use super::provider::{LLMProvider, LLMResponse};
use crate::error::Result;

/// Provider decorator accumulating [`TokenUsage`].
pub struct UsageTracker<P> {
    inner: P,
    total: Mutex<TokenUsage>,
    calls: Mutex<u64>,
}

impl<P: LLMProvider> UsageTracker<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            total: Mutex::new(TokenUsage::default()),
            calls: Mutex::new(0),
        }
    }

    /// Usage summed over all successful calls so far.
    pub fn total(&self) -> TokenUsage {
        self.total
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of successful calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.lock().map(|c| *c).unwrap_or_else(|p| *p.into_inner())
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: LLMProvider> LLMProvider for UsageTracker<P> {
    async fn complete(
        &self,
        messages: &[Message],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse> {
        let response = self.inner.complete(messages, config).await?;

        *self.calls.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        if let Some(usage) = &response.usage {
            let mut total = self.total.lock().unwrap_or_else(|p| p.into_inner());
            *total += usage.clone();
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                running_total = total.total_tokens,
                "Recorded token usage"
            );
        }

        Ok(response)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }
}
