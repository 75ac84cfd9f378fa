//! Agentic RAG: a bounded critique-refine loop

pub mod agentic;
pub mod critique;
pub mod state;

pub use agentic::{refine_query, AgenticRag, RagConfig, RagOutcome};
pub use critique::CritiqueResult;
pub use state::{RagDelta, RagPhase, RagState};
