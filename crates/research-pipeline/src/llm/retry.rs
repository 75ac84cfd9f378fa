//! Retry layer around a completion provider
//!
//! Pipelines never retry on their own. Wrap the provider in a
//! [`RetryingProvider`] to retry transient completion failures with a
//! bounded [`RetryPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::config::LLMConfig;
use super::message::Message;
use super::provider::{LLMProvider, LLMResponse};
use crate::error::Result;

/// Retry policy for transient completion failures.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RetryPolicy {
    /// Fail immediately on error.
    #[default]
    None,
    /// Retry with a constant delay between attempts.
    Fixed {
        /// Maximum number of retries after the first attempt
        max_retries: usize,
        interval: Duration,
    },
    /// Retry with exponentially increasing delays.
    Exponential {
        /// Maximum number of retries after the first attempt
        max_retries: usize,
        initial_interval: Duration,
        /// Cap on any single delay
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_retries: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_retries,
            interval,
        }
    }

    /// A multiplier below 1.0 (or NaN) is raised to 1.0, so delays never shrink.
    pub fn exponential(
        max_retries: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_retries,
            initial_interval,
            max_interval,
            multiplier: if multiplier >= 1.0 { multiplier } else { 1.0 },
        }
    }

    /// Whether retry number `retry` (0-indexed) is allowed.
    pub fn should_retry(&self, retry: usize) -> bool {
        retry < self.max_retries()
    }

    /// Delay before retry number `retry` (0-indexed).
    pub fn delay(&self, retry: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                // Finite growth keeps a zero initial interval at zero
                let growth = multiplier.powi(exponent).min(f64::MAX);
                let secs = initial_interval.as_secs_f64() * growth;
                Duration::try_from_secs_f64(secs)
                    .unwrap_or(*max_interval)
                    .min(*max_interval)
            }
        }
    }

    pub fn max_retries(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_retries, .. } => *max_retries,
            RetryPolicy::Exponential { max_retries, .. } => *max_retries,
        }
    }
}

/// Provider decorator that retries retryable completion errors.
///
/// Permanent errors and exhausted retries propagate unchanged.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: LLMProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: LLMProvider> LLMProvider for RetryingProvider<P> {
    async fn complete(
        &self,
        messages: &[Message],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse> {
        let mut retry = 0;
        loop {
            match self.inner.complete(messages, config).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && self.policy.should_retry(retry) => {
                    let delay = self.policy.delay(retry);
                    warn!(
                        provider = self.inner.name(),
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Completion failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    debug!(provider = self.inner.name(), retry, "Giving up on completion");
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::ScriptedProvider;

    #[test]
    fn test_retry_policy_none() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(0));
        assert_eq!(policy.delay(0), Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_exponential() {
        let policy =
            RetryPolicy::exponential(3, Duration::from_secs(1), Duration::from_secs(10), 2.0);
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));

        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_policy_exponential_cap() {
        let policy =
            RetryPolicy::exponential(10, Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(policy.delay(5), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_policy_exponential_overflow_saturates() {
        let policy = RetryPolicy::exponential(
            2000,
            Duration::from_millis(500),
            Duration::from_secs(10),
            2.0,
        );
        assert_eq!(policy.delay(1100), Duration::from_secs(10));
        assert_eq!(policy.delay(usize::MAX), Duration::from_secs(10));

        let immediate = RetryPolicy::exponential(5, Duration::ZERO, Duration::from_secs(10), 2.0);
        assert_eq!(immediate.delay(4000), Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_shrinking_multiplier_clamped() {
        for multiplier in [0.5, -1.0, f64::NAN] {
            let policy = RetryPolicy::exponential(
                5,
                Duration::from_secs(1),
                Duration::from_secs(10),
                multiplier,
            );
            assert_eq!(policy.delay(0), Duration::from_secs(1));
            assert_eq!(policy.delay(3), Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let scripted = ScriptedProvider::new()
            .with_failure(PipelineError::transient("429"))
            .with_failure(PipelineError::transient("503"))
            .with_text("done");
        let provider = RetryingProvider::new(scripted, RetryPolicy::fixed(2, Duration::ZERO));

        let response = provider.complete(&[Message::user("hi")], None).await.unwrap();

        assert_eq!(response.content, "done");
        assert_eq!(provider.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let scripted = ScriptedProvider::new()
            .with_failure(PipelineError::transient("timeout"))
            .with_failure(PipelineError::transient("timeout"))
            .with_text("too late");
        let provider = RetryingProvider::new(scripted, RetryPolicy::fixed(1, Duration::ZERO));

        let err = provider.complete(&[], None).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(provider.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let scripted = ScriptedProvider::new()
            .with_failure(PipelineError::permanent("401"))
            .with_text("unreachable");
        let provider = RetryingProvider::new(scripted, RetryPolicy::fixed(5, Duration::ZERO));

        assert!(provider.complete(&[], None).await.is_err());
        assert_eq!(provider.inner().call_count(), 1);
    }
}
