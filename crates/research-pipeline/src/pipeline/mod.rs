//! Linear research pipeline: state, stages and executor

pub mod research;
pub mod stages;
pub mod state;

pub use research::{
    next_stage, ResearchConfig, ResearchPipeline, ResearchReport, StageTransition, RESEARCH_EDGES,
};
pub use stages::StageOutcome;
pub use state::{CitationSet, PipelineState, Stage, StateDelta, WorkflowState};
