//! Agentic-RAG executor
//!
//! ```text
//!   ┌──────────┐    ┌──────────┐    ┌──────────┐   pass / cap   ┌──────┐
//!   │ Retrieve │──▶│ Generate │──▶│ Critique │──────────────▶│ Done │
//!   └──────────┘    └──────────┘    └────┬─────┘                └──────┘
//!        ▲                               │ otherwise
//!        │          ┌──────────┐         │
//!        └──────────│  Refine  │◀────────┘
//!                   └──────────┘
//! ```
//!
//! The loop runs at most `max_iterations` times. It stops early when the
//! critique is satisfactory with enough confidence, and otherwise returns
//! the last answer once the cap is reached.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::critique::{critique, CritiqueResult};
use super::state::{RagDelta, RagState};
use crate::error::{PipelineError, Result};
use crate::llm::{LLMConfig, LLMProvider, TokenUsage};
use crate::pipeline::PipelineState;
use crate::prompts::Prompts;
use crate::retrieval::Retriever;

/// Settings for the critique-refine loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Hard cap on iterations; must be at least 1
    pub max_iterations: usize,
    /// Minimum confidence for the quality gate
    pub confidence_threshold: f64,
    /// Final confidence below this flags hallucinations
    pub hallucination_threshold: f64,
    /// Characters of critique feedback appended to the original query
    pub feedback_excerpt_chars: usize,
    /// Retrieval hits passed to generation and critique
    pub context_limit: usize,
    pub temperature: f64,
    pub generate_max_tokens: u64,
    pub critique_max_tokens: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            confidence_threshold: 0.8,
            hallucination_threshold: 0.7,
            feedback_excerpt_chars: 200,
            context_limit: 5,
            temperature: 0.3,
            generate_max_tokens: 1500,
            critique_max_tokens: 500,
        }
    }
}

impl RagConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_feedback_excerpt_chars(mut self, chars: usize) -> Self {
        self.feedback_excerpt_chars = chars;
        self
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(PipelineError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.context_limit == 0 {
            return Err(PipelineError::Config(
                "context_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of an agentic-RAG run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagOutcome {
    pub run_id: String,
    pub answer: String,
    pub confidence: f64,
    pub iteration_count: usize,
    pub hallucinations_detected: bool,
    pub refinement_log: Vec<String>,
    pub usage: TokenUsage,
}

/// Next query: the original query plus at most `max_chars` characters of
/// feedback.
///
/// Always rebuilt from the original, so its length does not grow with the
/// iteration count.
pub fn refine_query(original: &str, feedback: &str, max_chars: usize) -> String {
    let excerpt: String = feedback.trim().chars().take(max_chars).collect();
    let excerpt = excerpt.trim_end();
    if excerpt.is_empty() {
        return original.to_string();
    }
    format!("{} {}", original, excerpt)
}

/// Bounded critique-refine executor.
pub struct AgenticRag {
    llm: Arc<dyn LLMProvider>,
    retriever: Arc<dyn Retriever>,
    config: RagConfig,
}

impl AgenticRag {
    pub fn new(llm: Arc<dyn LLMProvider>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            llm,
            retriever,
            config: RagConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RagConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Run the loop until the quality gate passes or the cap is hit.
    pub async fn run(&self, query: &str) -> Result<RagOutcome> {
        self.config.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("agentic_rag", run_id = %run_id);

        async {
            info!(
                query = %query,
                max_iterations = self.config.max_iterations,
                "Starting agentic RAG run"
            );
            let (state, usage) = self.execute(RagState::new(query)).await?;

            let answer = state
                .answer()
                .ok_or_else(|| PipelineError::permanent("loop finished without an answer"))?
                .to_string();
            let confidence = state.critique().map(|c| c.confidence).unwrap_or_default();
            let hallucinations_detected = confidence < self.config.hallucination_threshold;

            info!(
                iterations = state.iteration(),
                confidence,
                hallucinations_detected,
                "Agentic RAG run complete"
            );

            Ok(RagOutcome {
                run_id: run_id.clone(),
                answer,
                confidence,
                iteration_count: state.iteration(),
                hallucinations_detected,
                refinement_log: state.refinement_log().to_vec(),
                usage,
            })
        }
        .instrument(span)
        .await
    }

    /// Drive the loop from `initial` to a terminal state.
    pub async fn execute(&self, initial: RagState) -> Result<(RagState, TokenUsage)> {
        let max = self.config.max_iterations;
        let mut state = initial;
        let mut usage = TokenUsage::default();

        for iteration in 1..=max {
            state = state.apply(RagDelta::begin_iteration(iteration));

            let mut context = self.retriever.retrieve(state.current_query()).await?;
            context.truncate(self.config.context_limit);
            debug!(iteration, hits = context.len(), "Context retrieved");
            state = state.apply(RagDelta::with_context(context));

            let (answer, generate_usage) = self.generate(&state).await?;
            usage += generate_usage.unwrap_or_default();
            state = state.apply(RagDelta::with_answer(answer));

            let answer = state.answer().unwrap_or_default();
            let config = self.stage_config(self.config.critique_max_tokens);
            let (verdict, critique_usage) = critique(
                self.llm.as_ref(),
                &config,
                state.original_query(),
                answer,
                state.context(),
            )
            .await?;
            usage += critique_usage.unwrap_or_default();

            let passed = verdict.passes(self.config.confidence_threshold);
            let log_line = log_line(iteration, &verdict, passed);
            info!(
                iteration,
                satisfactory = verdict.satisfactory,
                confidence = verdict.confidence,
                passed,
                "Critique complete"
            );
            let feedback = verdict.feedback.clone();
            state = state.apply(RagDelta::with_critique(verdict, log_line));

            if passed {
                break;
            }
            if iteration == max {
                warn!(max_iterations = max, "Quality gate not met, returning last answer");
                break;
            }

            let refined = refine_query(
                state.original_query(),
                &feedback,
                self.config.feedback_excerpt_chars,
            );
            debug!(refined = %refined, "Query refined");
            state = state.apply(RagDelta::refined(refined));
        }

        Ok((state.apply(RagDelta::done()), usage))
    }

    async fn generate(&self, state: &RagState) -> Result<(String, Option<TokenUsage>)> {
        let messages = Prompts::generate(state.original_query(), state.context());
        let config = self.stage_config(self.config.generate_max_tokens);
        let response = self.llm.complete(&messages, Some(&config)).await?;

        if response.content.trim().is_empty() {
            return Err(PipelineError::permanent("generation returned an empty answer"));
        }
        Ok((response.content, response.usage))
    }

    fn stage_config(&self, max_tokens: u64) -> LLMConfig {
        LLMConfig::sampling(self.config.temperature, max_tokens)
    }
}

fn log_line(iteration: usize, verdict: &CritiqueResult, passed: bool) -> String {
    format!(
        "iteration {}: satisfactory={} confidence={:.2} passed={} feedback={}",
        iteration, verdict.satisfactory, verdict.confidence, passed, verdict.feedback
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;
    use crate::retrieval::{SearchResult, StaticRetriever};

    #[test]
    fn test_refine_query_caps_feedback() {
        let feedback = "x".repeat(500);
        let refined = refine_query("What is Rust?", &feedback, 200);

        assert!(refined.starts_with("What is Rust? "));
        assert_eq!(refined.chars().count(), "What is Rust? ".len() + 200);
    }

    #[test]
    fn test_refine_query_char_boundary() {
        let refined = refine_query("q", "héllo wörld", 4);
        assert_eq!(refined, "q héll");
    }

    #[test]
    fn test_refine_query_empty_feedback() {
        assert_eq!(refine_query("q", "   ", 200), "q");
        assert_eq!(refine_query("q", "more detail", 0), "q");
    }

    #[test]
    fn test_config_validation() {
        assert!(RagConfig::default().validate().is_ok());
        assert!(RagConfig::default().with_max_iterations(0).validate().is_err());
        assert!(RagConfig::default().with_confidence_threshold(1.5).validate().is_err());
        assert!(RagConfig::default().with_context_limit(0).validate().is_err());
    }

    #[tokio::test]
    async fn test_context_limit_applied() {
        let corpus = (0..10)
            .map(|i| SearchResult::new(format!("rust doc {}", i), format!("https://d/{}", i), "rust"))
            .collect();
        let retriever = StaticRetriever::new(corpus).with_top_k(10);
        let llm = Arc::new(ScriptedProvider::from_texts([
            "answer [1]",
            r#"{"satisfactory": true, "confidence": 0.9, "feedback": ""}"#,
        ]));
        let rag = AgenticRag::new(llm, Arc::new(retriever))
            .with_config(RagConfig::default().with_context_limit(2));

        let (state, _) = rag.execute(RagState::new("rust")).await.unwrap();

        assert_eq!(state.context().len(), 2);
        assert!(state.is_terminal());
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let llm = Arc::new(ScriptedProvider::from_texts(["  "]));
        let rag = AgenticRag::new(llm, Arc::new(StaticRetriever::default()));

        let err = rag.run("q").await.unwrap_err();
        assert!(err.to_string().contains("empty answer"));
    }
}
