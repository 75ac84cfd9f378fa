//! Research stage functions
//!
//! Each stage reads the current [`WorkflowState`], calls its injected
//! collaborator and returns a [`StateDelta`]. Parsing never fails a stage;
//! only collaborator errors do.

use futures::{StreamExt, TryStreamExt};
use tracing::{debug, warn};

use super::state::{CitationSet, StateDelta, WorkflowState};
use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider, Message, TokenUsage};
use crate::parse;
use crate::prompts::Prompts;
use crate::retrieval::{Retriever, SearchResult};

/// What a stage hands back to the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub delta: StateDelta,
    /// Tokens spent by this stage
    pub usage: TokenUsage,
}

impl StageOutcome {
    fn new(delta: StateDelta, usage: Option<TokenUsage>) -> Self {
        Self {
            delta,
            usage: usage.unwrap_or_default(),
        }
    }
}

async fn complete_text(
    llm: &dyn LLMProvider,
    messages: &[Message],
    config: &LLMConfig,
) -> Result<(String, Option<TokenUsage>)> {
    let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
    debug!(provider = llm.name(), prompt_chars, "Calling completion");
    let response = llm.complete(messages, Some(config)).await?;
    Ok((response.content, response.usage))
}

/// Decompose the query into search queries.
///
/// Falls back to `[query]` when the completion holds no usable list.
pub async fn plan(
    state: &WorkflowState,
    llm: &dyn LLMProvider,
    config: &LLMConfig,
) -> Result<StageOutcome> {
    let (text, usage) = complete_text(llm, &Prompts::plan(state.query()), config).await?;

    let parsed = parse::plan_or_query(&text, state.query());
    if parsed.is_default() {
        warn!(query = %state.query(), "No search list in planner output, searching the query itself");
    }
    let plan = parsed.into_inner();
    debug!(steps = plan.len(), "Plan ready");

    Ok(StageOutcome::new(StateDelta::with_plan(plan), usage))
}

/// Run one retrieval per planned query.
///
/// Up to `concurrency` retrievals are in flight at once; results are
/// concatenated in plan order regardless of completion order. Duplicate
/// URLs across queries are kept.
pub async fn search(
    state: &WorkflowState,
    retriever: &dyn Retriever,
    concurrency: usize,
) -> Result<StageOutcome> {
    let queries = state.plan_or_query();

    let lookups: Vec<_> = queries.iter().map(|q| retriever.retrieve(q)).collect();
    let per_query: Vec<Vec<SearchResult>> = futures::stream::iter(lookups)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let results: Vec<SearchResult> = per_query.into_iter().flatten().collect();
    debug!(
        retriever = retriever.name(),
        queries = queries.len(),
        hits = results.len(),
        "Search complete"
    );

    Ok(StageOutcome::new(StateDelta::with_search_results(results), None))
}

/// Turn search hits into bullet facts, one per non-empty line.
pub async fn extract(
    state: &WorkflowState,
    llm: &dyn LLMProvider,
    config: &LLMConfig,
) -> Result<StageOutcome> {
    let results = state.search_results().unwrap_or_default();
    let messages = Prompts::extract(state.query(), results);
    let (text, usage) = complete_text(llm, &messages, config).await?;

    let facts = parse::non_empty_lines(&text);
    debug!(facts = facts.len(), "Extraction complete");

    Ok(StageOutcome::new(StateDelta::with_extracted_info(facts), usage))
}

/// Write the cited report and pull its citations.
pub async fn synthesize(
    state: &WorkflowState,
    llm: &dyn LLMProvider,
    config: &LLMConfig,
) -> Result<StageOutcome> {
    let facts = state.extracted_info().unwrap_or_default();
    let messages = Prompts::synthesize(state.query(), facts);
    let (report, usage) = complete_text(llm, &messages, config).await?;

    let citations: CitationSet = parse::citations(&report).into_iter().collect();
    debug!(citations = citations.len(), report_chars = report.len(), "Synthesis complete");

    Ok(StageOutcome::new(StateDelta::with_report(report, citations), usage))
}
