//! # Agent Module
//!
//! Wires the research pipeline library to a local Ollama model through
//! Rig, and renders run results for the terminal.
//!
//! Provider layering, outermost first:
//!
//! ```text
//! UsageTracker ─▶ RetryingProvider ─▶ RigAgentAdapter ─▶ rig Agent (Ollama)
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rig::client::{CompletionClient, ProviderClient};
use rig::providers::ollama;
use tracing::{debug, info};

use research_pipeline::{
    AgenticRag, LLMProvider, RagOutcome, ResearchPipeline, ResearchReport, Retriever,
    RetryingProvider, RigAgentAdapter, SearchResult, StaticRetriever, SyntheticRetriever,
    UsageTracker,
};

use crate::config::Config;

// =============================================================================
// PROVIDER WIRING
// =============================================================================
/// Build the Ollama-backed provider stack.
///
/// # Rust Concept: impl Trait in return position
///
/// The concrete type is a stack of generic decorators around Rig's Ollama
/// model. `impl LLMProvider` hides it while keeping static dispatch inside
/// the stack.
fn ollama_provider(config: &Config) -> UsageTracker<impl LLMProvider> {
    // Rig's Ollama client reads its base URL from the environment
    std::env::set_var("OLLAMA_API_BASE_URL", &config.ollama_host);
    let client = ollama::Client::from_env();
    let agent = client.agent(&config.model).build();

    debug!(
        host = %config.ollama_host,
        model = %config.model,
        retries = config.llm_max_retries,
        "Ollama provider ready"
    );

    let adapter = RigAgentAdapter::with_names(agent, "ollama", config.model.clone());
    UsageTracker::new(RetryingProvider::new(adapter, config.retry_policy()))
}

/// Read a JSON array of `{title, url, snippet}` objects.
pub fn load_corpus(path: &Path) -> Result<Vec<SearchResult>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    let corpus: Vec<SearchResult> = serde_json::from_str(&raw)
        .with_context(|| format!("Corpus file {} is not a JSON array of results", path.display()))?;
    Ok(corpus)
}

// =============================================================================
// RESEARCH AGENT
// =============================================================================
/// Runs either executor against a local model.
pub struct ResearchAgent {
    config: Config,
    retriever: Arc<dyn Retriever>,
}

impl ResearchAgent {
    /// Agent backed by the synthetic retriever (one placeholder hit per query).
    pub fn new(config: Config) -> Self {
        Self {
            config,
            retriever: Arc::new(SyntheticRetriever),
        }
    }

    /// Agent backed by a fixed corpus.
    pub fn with_corpus(config: Config, corpus: Vec<SearchResult>) -> Self {
        let top_k = config.max_search_results;
        Self {
            config,
            retriever: Arc::new(StaticRetriever::new(corpus).with_top_k(top_k)),
        }
    }

    pub fn retriever_name(&self) -> &str {
        self.retriever.name()
    }

    /// Plan → Search → Extract → Synthesize.
    pub async fn research(&self, query: &str) -> Result<ResearchReport> {
        let tracker = Arc::new(ollama_provider(&self.config));
        let pipeline = ResearchPipeline::new(tracker.clone(), self.retriever.clone())
            .with_config(self.config.research_config());

        let report = pipeline.run(query).await.context("Research pipeline failed")?;

        let usage = tracker.total();
        info!(
            calls = tracker.calls(),
            total_tokens = usage.total_tokens,
            "LLM usage"
        );
        Ok(report)
    }

    /// Retrieve → Generate → Critique, refined until the quality gate passes.
    pub async fn agentic_rag(&self, query: &str) -> Result<RagOutcome> {
        let tracker = Arc::new(ollama_provider(&self.config));
        let rag = AgenticRag::new(tracker.clone(), self.retriever.clone())
            .with_config(self.config.rag_config());

        let outcome = rag.run(query).await.context("Agentic RAG run failed")?;

        let usage = tracker.total();
        info!(
            calls = tracker.calls(),
            total_tokens = usage.total_tokens,
            "LLM usage"
        );
        Ok(outcome)
    }
}

// =============================================================================
// RENDERING
// =============================================================================
fn banner(title: &str) -> String {
    let rule = "=".repeat(60);
    format!("{}\n{}\n{}", rule, title, rule)
}

pub fn render_report(report: &ResearchReport) -> String {
    let mut out = banner("RESEARCH REPORT");
    out.push_str("\n\n");
    out.push_str(report.report.trim());
    out.push_str("\n\n");

    if report.citations.is_empty() {
        out.push_str("Citations: none\n");
    } else {
        out.push_str(&format!("Citations ({}):\n", report.citations.len()));
        for citation in &report.citations {
            out.push_str(&format!("  {}\n", citation));
        }
    }

    out.push_str(&format!(
        "\nStages: {}\nTokens: {}\n",
        report
            .transitions
            .iter()
            .map(|t| t.from.as_str())
            .collect::<Vec<_>>()
            .join(" -> "),
        report.usage.total_tokens
    ));
    out
}

pub fn render_rag(outcome: &RagOutcome) -> String {
    let mut out = banner("AGENTIC RAG ANSWER");
    out.push_str("\n\n");
    out.push_str(outcome.answer.trim());
    out.push_str(&format!(
        "\n\nConfidence: {:.2}\nIterations: {}\n",
        outcome.confidence, outcome.iteration_count
    ));
    if outcome.hallucinations_detected {
        out.push_str("Warning: low confidence, the answer may contain unsupported claims\n");
    }

    out.push_str("\nRefinement log:\n");
    for line in &outcome.refinement_log {
        out.push_str(&format!("  {}\n", line));
    }
    out
}
