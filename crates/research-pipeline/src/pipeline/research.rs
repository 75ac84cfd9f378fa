//! Research pipeline executor
//!
//! ```text
//!   Plan ──▶ Search ──▶ Extract ──▶ Synthesize ──▶ Done
//! ```
//!
//! The edge list is fixed: no conditional edges and no retries. Stage
//! parsers degrade to defaults, so the only way a run fails is a
//! collaborator error, which propagates immediately.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::stages::{self, StageOutcome};
use super::state::{PipelineState, Stage, StateDelta, WorkflowState};
use crate::error::{PipelineError, Result};
use crate::llm::{LLMConfig, LLMProvider, TokenUsage};
use crate::retrieval::Retriever;

/// Fixed edge list of the research pipeline.
pub const RESEARCH_EDGES: [(Stage, Stage); 4] = [
    (Stage::Plan, Stage::Search),
    (Stage::Search, Stage::Extract),
    (Stage::Extract, Stage::Synthesize),
    (Stage::Synthesize, Stage::Done),
];

/// Successor of `stage` in [`RESEARCH_EDGES`]; `None` for `Done`.
pub fn next_stage(stage: Stage) -> Option<Stage> {
    RESEARCH_EDGES
        .iter()
        .find(|(from, _)| *from == stage)
        .map(|(_, to)| *to)
}

/// Settings for a research run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchConfig {
    pub temperature: f64,
    pub plan_max_tokens: u64,
    pub extract_max_tokens: u64,
    pub synthesize_max_tokens: u64,
    /// Retrieval calls allowed in flight during Search
    pub search_concurrency: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            plan_max_tokens: 500,
            extract_max_tokens: 1500,
            synthesize_max_tokens: 2000,
            search_concurrency: 4,
        }
    }
}

impl ResearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_search_concurrency(mut self, concurrency: usize) -> Self {
        self.search_concurrency = concurrency;
        self
    }

    fn stage_config(&self, max_tokens: u64) -> LLMConfig {
        LLMConfig::sampling(self.temperature, max_tokens)
    }
}

/// One executed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
}

/// Result of a research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub run_id: String,
    pub query: String,
    pub report: String,
    pub citations: Vec<String>,
    pub transitions: Vec<StageTransition>,
    pub usage: TokenUsage,
}

/// Plan → Search → Extract → Synthesize executor.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = ResearchPipeline::new(llm, Arc::new(SyntheticRetriever));
/// let report = pipeline.run("What are the latest developments in AI agents?").await?;
/// println!("{}", report.report);
/// ```
pub struct ResearchPipeline {
    llm: Arc<dyn LLMProvider>,
    retriever: Arc<dyn Retriever>,
    config: ResearchConfig,
}

impl ResearchPipeline {
    pub fn new(llm: Arc<dyn LLMProvider>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            llm,
            retriever,
            config: ResearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run the pipeline to completion.
    pub async fn run(&self, query: &str) -> Result<ResearchReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("research", run_id = %run_id);

        async {
            info!(query = %query, "Starting research run");
            let (state, transitions, usage) = self.execute(WorkflowState::new(query)).await?;

            let report = state
                .report()
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| PipelineError::permanent("synthesis produced an empty report"))?
                .to_string();

            info!(
                citations = state.citations().len(),
                total_tokens = usage.total_tokens,
                "Research run complete"
            );

            Ok(ResearchReport {
                run_id: run_id.clone(),
                query: state.query().to_string(),
                report,
                citations: state.citations().as_slice().to_vec(),
                transitions,
                usage,
            })
        }
        .instrument(span)
        .await
    }

    /// Walk the edge list from `Plan`, returning the terminal state.
    pub async fn execute(
        &self,
        initial: WorkflowState,
    ) -> Result<(WorkflowState, Vec<StageTransition>, TokenUsage)> {
        let mut state = initial;
        let mut transitions = Vec::with_capacity(RESEARCH_EDGES.len());
        let mut usage = TokenUsage::default();
        let mut stage = Stage::Plan;

        while let Some(next) = next_stage(stage) {
            let outcome = self.run_stage(stage, &state).await?;
            info!(
                stage = %stage,
                fields = ?outcome.delta.touched_fields(),
                "Stage complete"
            );

            usage += outcome.usage;
            state = state.apply(outcome.delta.completing(stage));
            transitions.push(StageTransition { from: stage, to: next });
            stage = next;
        }

        state = state.apply(StateDelta::default().completing(Stage::Done));
        Ok((state, transitions, usage))
    }

    async fn run_stage(&self, stage: Stage, state: &WorkflowState) -> Result<StageOutcome> {
        let llm = self.llm.as_ref();
        match stage {
            Stage::Plan => {
                stages::plan(state, llm, &self.config.stage_config(self.config.plan_max_tokens))
                    .await
            }
            Stage::Search => {
                stages::search(state, self.retriever.as_ref(), self.config.search_concurrency).await
            }
            Stage::Extract => {
                let config = self.config.stage_config(self.config.extract_max_tokens);
                stages::extract(state, llm, &config).await
            }
            Stage::Synthesize => {
                let config = self.config.stage_config(self.config.synthesize_max_tokens);
                stages::synthesize(state, llm, &config).await
            }
            Stage::Done => Ok(StageOutcome {
                delta: StateDelta::default(),
                usage: TokenUsage::default(),
            }),
        }
    }
}
