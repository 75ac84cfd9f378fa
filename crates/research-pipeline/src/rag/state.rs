//! Critique-refine loop state

use serde::{Deserialize, Serialize};

use super::critique::CritiqueResult;
use crate::pipeline::PipelineState;
use crate::retrieval::SearchResult;

/// Phases of one critique-refine iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagPhase {
    Retrieve,
    Generate,
    Critique,
    Refine,
    Done,
}

impl RagPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Generate => "generate",
            Self::Critique => "critique",
            Self::Refine => "refine",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for RagPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an agentic-RAG run.
///
/// `answer` and `critique` are replaced on every iteration; the
/// refinement log only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagState {
    original_query: String,
    current_query: String,
    iteration: usize,
    context: Option<Vec<SearchResult>>,
    answer: Option<String>,
    critique: Option<CritiqueResult>,
    refinement_log: Vec<String>,
    phase: Option<RagPhase>,
}

impl RagState {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            current_query: query.clone(),
            original_query: query,
            iteration: 0,
            context: None,
            answer: None,
            critique: None,
            refinement_log: Vec::new(),
            phase: None,
        }
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    pub fn current_query(&self) -> &str {
        &self.current_query
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn context(&self) -> &[SearchResult] {
        self.context.as_deref().unwrap_or_default()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn critique(&self) -> Option<&CritiqueResult> {
        self.critique.as_ref()
    }

    pub fn refinement_log(&self) -> &[String] {
        &self.refinement_log
    }

    pub fn phase(&self) -> Option<RagPhase> {
        self.phase
    }
}

/// Update for [`RagState`]. `None` leaves a field untouched and log lines
/// are appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagDelta {
    pub iteration: Option<usize>,
    pub current_query: Option<String>,
    pub context: Option<Vec<SearchResult>>,
    pub answer: Option<String>,
    pub critique: Option<CritiqueResult>,
    pub log: Vec<String>,
    pub phase: Option<RagPhase>,
}

impl RagDelta {
    pub fn begin_iteration(iteration: usize) -> Self {
        Self {
            iteration: Some(iteration),
            ..Default::default()
        }
    }

    pub fn with_context(context: Vec<SearchResult>) -> Self {
        Self {
            context: Some(context),
            phase: Some(RagPhase::Retrieve),
            ..Default::default()
        }
    }

    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            phase: Some(RagPhase::Generate),
            ..Default::default()
        }
    }

    pub fn with_critique(critique: CritiqueResult, log_line: impl Into<String>) -> Self {
        Self {
            critique: Some(critique),
            log: vec![log_line.into()],
            phase: Some(RagPhase::Critique),
            ..Default::default()
        }
    }

    pub fn refined(query: impl Into<String>) -> Self {
        Self {
            current_query: Some(query.into()),
            phase: Some(RagPhase::Refine),
            ..Default::default()
        }
    }

    pub fn done() -> Self {
        Self {
            phase: Some(RagPhase::Done),
            ..Default::default()
        }
    }
}

impl PipelineState for RagState {
    type Delta = RagDelta;

    fn apply(&self, delta: Self::Delta) -> Self {
        let mut next = self.clone();

        if let Some(iteration) = delta.iteration {
            next.iteration = iteration;
        }
        if let Some(query) = delta.current_query {
            next.current_query = query;
        }
        if let Some(context) = delta.context {
            next.context = Some(context);
        }
        if let Some(answer) = delta.answer {
            next.answer = Some(answer);
        }
        if let Some(critique) = delta.critique {
            next.critique = Some(critique);
        }
        next.refinement_log.extend(delta.log);
        if let Some(phase) = delta.phase {
            next.phase = Some(phase);
        }

        next
    }

    fn is_terminal(&self) -> bool {
        self.phase == Some(RagPhase::Done)
    }
}
