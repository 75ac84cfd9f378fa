//! Workflow state and deltas
//!
//! A run threads one [`WorkflowState`] through its stages. Stages never
//! touch the state directly: they return a [`StateDelta`] and the executor
//! produces the next state with [`PipelineState::apply`]. Applying a delta
//! assigns only the fields the delta carries, so nothing set by an earlier
//! stage can be cleared by a later one.

use serde::{Deserialize, Serialize};

use crate::retrieval::SearchResult;

/// State that evolves by applying deltas.
pub trait PipelineState: Clone + Send + Sync + 'static {
    type Delta: Clone + Send + Sync + 'static;

    /// Apply a delta to produce a new state. The original is not modified.
    fn apply(&self, delta: Self::Delta) -> Self;

    /// Whether the run has reached its terminal state.
    fn is_terminal(&self) -> bool;
}

/// Stages of the research pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Search,
    Extract,
    Synthesize,
    Done,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Search => "search",
            Self::Extract => "extract",
            Self::Synthesize => "synthesize",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated citations in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationSet(Vec<String>);

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a citation. Returns `false` if it was already present.
    pub fn insert(&mut self, citation: impl Into<String>) -> bool {
        let citation = citation.into();
        if self.0.contains(&citation) {
            return false;
        }
        self.0.push(citation);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for CitationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CitationSet::new();
        for citation in iter {
            set.insert(citation);
        }
        set
    }
}

/// The record threaded through a research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    query: String,
    plan: Option<Vec<String>>,
    search_results: Option<Vec<SearchResult>>,
    extracted_info: Option<Vec<String>>,
    report: Option<String>,
    citations: CitationSet,
    /// Most recently completed stage; observability only
    current_step: Option<Stage>,
}

impl WorkflowState {
    /// Fresh state with only the query populated
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            plan: None,
            search_results: None,
            extracted_info: None,
            report: None,
            citations: CitationSet::new(),
            current_step: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn plan(&self) -> Option<&[String]> {
        self.plan.as_deref()
    }

    pub fn search_results(&self) -> Option<&[SearchResult]> {
        self.search_results.as_deref()
    }

    pub fn extracted_info(&self) -> Option<&[String]> {
        self.extracted_info.as_deref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn citations(&self) -> &CitationSet {
        &self.citations
    }

    pub fn current_step(&self) -> Option<Stage> {
        self.current_step
    }

    /// The plan, or the query itself when no plan has been made.
    pub fn plan_or_query(&self) -> Vec<String> {
        match &self.plan {
            Some(plan) if !plan.is_empty() => plan.clone(),
            _ => vec![self.query.clone()],
        }
    }
}

/// Fields a stage wants to set. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub plan: Option<Vec<String>>,
    pub search_results: Option<Vec<SearchResult>>,
    pub extracted_info: Option<Vec<String>>,
    pub report: Option<String>,
    pub citations: Option<CitationSet>,
    pub completed_step: Option<Stage>,
}

impl StateDelta {
    pub fn with_plan(plan: Vec<String>) -> Self {
        Self {
            plan: Some(plan),
            ..Default::default()
        }
    }

    pub fn with_search_results(results: Vec<SearchResult>) -> Self {
        Self {
            search_results: Some(results),
            ..Default::default()
        }
    }

    pub fn with_extracted_info(info: Vec<String>) -> Self {
        Self {
            extracted_info: Some(info),
            ..Default::default()
        }
    }

    pub fn with_report(report: impl Into<String>, citations: CitationSet) -> Self {
        Self {
            report: Some(report.into()),
            citations: Some(citations),
            ..Default::default()
        }
    }

    /// Mark the stage that produced this delta
    pub fn completing(mut self, stage: Stage) -> Self {
        self.completed_step = Some(stage);
        self
    }

    /// Names of the fields this delta sets, for logging.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.plan.is_some() {
            fields.push("plan");
        }
        if self.search_results.is_some() {
            fields.push("search_results");
        }
        if self.extracted_info.is_some() {
            fields.push("extracted_info");
        }
        if self.report.is_some() {
            fields.push("report");
        }
        if self.citations.is_some() {
            fields.push("citations");
        }
        fields
    }
}

impl PipelineState for WorkflowState {
    type Delta = StateDelta;

    fn apply(&self, delta: Self::Delta) -> Self {
        let mut next = self.clone();

        if let Some(plan) = delta.plan {
            next.plan = Some(plan);
        }
        if let Some(results) = delta.search_results {
            next.search_results = Some(results);
        }
        if let Some(info) = delta.extracted_info {
            next.extracted_info = Some(info);
        }
        // Resynthesis replaces the previous report and its citations.
        if let Some(report) = delta.report {
            next.report = Some(report);
        }
        if let Some(citations) = delta.citations {
            next.citations = citations;
        }
        if let Some(step) = delta.completed_step {
            next.current_step = Some(step);
        }

        next
    }

    fn is_terminal(&self) -> bool {
        self.current_step.is_some_and(|s| s.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_only_query() {
        let state = WorkflowState::new("What is Rust?");

        assert_eq!(state.query(), "What is Rust?");
        assert!(state.plan().is_none());
        assert!(state.search_results().is_none());
        assert!(state.extracted_info().is_none());
        assert!(state.report().is_none());
        assert!(state.citations().is_empty());
        assert!(state.current_step().is_none());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_apply_is_pure() {
        let state = WorkflowState::new("q");
        let next = state.apply(StateDelta::with_plan(vec!["a".to_string()]).completing(Stage::Plan));

        assert!(state.plan().is_none());
        assert_eq!(next.plan().unwrap(), ["a".to_string()]);
        assert_eq!(next.current_step(), Some(Stage::Plan));
    }

    #[test]
    fn test_later_delta_never_clears_fields() {
        let state = WorkflowState::new("q")
            .apply(StateDelta::with_plan(vec!["a".to_string()]))
            .apply(StateDelta::with_extracted_info(vec!["fact".to_string()]));

        assert_eq!(state.plan().unwrap().len(), 1);
        assert_eq!(state.extracted_info().unwrap(), ["fact".to_string()]);
    }

    #[test]
    fn test_resynthesis_replaces_report() {
        let first: CitationSet = ["[1] http://a"].into_iter().collect();
        let second: CitationSet = ["[1] http://b"].into_iter().collect();

        let state = WorkflowState::new("q")
            .apply(StateDelta::with_report("draft", first))
            .apply(StateDelta::with_report("final", second));

        assert_eq!(state.report(), Some("final"));
        assert_eq!(state.citations().as_slice(), ["[1] http://b".to_string()]);
    }

    #[test]
    fn test_citation_set_dedup_order() {
        let set: CitationSet = ["[1] http://a", "[2] http://b", "[1] http://a"]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice(), ["[1] http://a".to_string(), "[2] http://b".to_string()]);
    }

    #[test]
    fn test_plan_or_query() {
        let state = WorkflowState::new("q");
        assert_eq!(state.plan_or_query(), vec!["q".to_string()]);

        let planned = state.apply(StateDelta::with_plan(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(planned.plan_or_query().len(), 2);
    }

    #[test]
    fn test_touched_fields() {
        let delta = StateDelta::with_report("r", CitationSet::new());
        assert_eq!(delta.touched_fields(), vec!["report", "citations"]);
    }

    #[test]
    fn test_terminal_after_done() {
        let state = WorkflowState::new("q").apply(StateDelta::default().completing(Stage::Done));
        assert!(state.is_terminal());
    }
}
