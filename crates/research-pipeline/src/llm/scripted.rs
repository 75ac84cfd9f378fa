//! Scripted provider for deterministic runs
//!
//! Replays a fixed queue of responses in call order and records every
//! conversation it receives. Used by the test suites and by the offline
//! demo mode of the CLI.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::config::{LLMConfig, TokenUsage};
use super::message::Message;
use super::provider::{LLMProvider, LLMResponse};
use crate::error::{PipelineError, Result};

/// One scripted reply: either text or a completion failure.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(PipelineError),
}

/// Provider that replays scripted replies in order.
///
/// When the script runs out, further calls fail with a permanent
/// completion error so that a test never silently loops.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<Vec<Message>>>,
    usage_per_call: Option<TokenUsage>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from plain text replies.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for text in texts {
            provider.push_text(text);
        }
        provider
    }

    /// Attach the same usage figures to every successful reply.
    pub fn with_usage_per_call(mut self, usage: TokenUsage) -> Self {
        self.usage_per_call = Some(usage);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_failure(self, error: PipelineError) -> Self {
        self.lock_replies().push_back(ScriptedReply::Fail(error));
        self
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.lock_replies().push_back(ScriptedReply::Text(text.into()));
    }

    /// Number of `complete` calls received so far.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Conversations received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.lock_calls().clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Message>>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _config: Option<&LLMConfig>,
    ) -> Result<LLMResponse> {
        self.lock_calls().push(messages.to_vec());

        match self.lock_replies().pop_front() {
            Some(ScriptedReply::Text(text)) => {
                let response = LLMResponse::new(text);
                Ok(match &self.usage_per_call {
                    Some(usage) => response.with_usage(usage.clone()),
                    None => response,
                })
            }
            Some(ScriptedReply::Fail(error)) => Err(error),
            None => Err(PipelineError::permanent("scripted provider exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records_calls() {
        let provider = ScriptedProvider::from_texts(["first", "second"]);

        let a = provider.complete(&[Message::user("q1")], None).await.unwrap();
        let b = provider.complete(&[Message::user("q2")], None).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls()[1][0].content, "q2");
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let provider = ScriptedProvider::new();
        let err = provider.complete(&[], None).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let provider = ScriptedProvider::new()
            .with_failure(PipelineError::transient("503"))
            .with_text("ok");

        assert!(provider.complete(&[], None).await.is_err());
        assert_eq!(provider.complete(&[], None).await.unwrap().content, "ok");
        assert_eq!(provider.remaining(), 0);
    }
}
