//! research-pipeline: research agent and agentic RAG executors for Rig
//!
//! - `ResearchPipeline`: Plan → Search → Extract → Synthesize over a fixed edge list
//! - `AgenticRag`: Retrieve → Generate → Critique, refined until the quality gate
//!   passes or the iteration cap is hit
//! - `DocumentReviewer`: concurrent per-document reviews, collected in input order
//!
//! Both executors take their collaborators explicitly: an `LLMProvider` for
//! completions and a `Retriever` for context.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rig::client::{CompletionClient, ProviderClient};
//! use rig::providers::ollama::Client;
//! use research_pipeline::{AgenticRag, RigAgentAdapter, SyntheticRetriever};
//!
//! let agent = Client::from_env().agent("llama3.2").build();
//! let llm = Arc::new(RigAgentAdapter::new(agent));
//!
//! let outcome = AgenticRag::new(llm, Arc::new(SyntheticRetriever))
//!     .run("How do Rust async runtimes schedule tasks?")
//!     .await?;
//! println!("{} (confidence {:.2})", outcome.answer, outcome.confidence);
//! ```

pub mod error;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod rag;
pub mod retrieval;
pub mod review;

pub use error::{PipelineError, Result};
pub use llm::{
    LLMConfig, LLMProvider, LLMResponse, Message, RetryPolicy, RetryingProvider, RigAgentAdapter,
    Role, ScriptedProvider, ScriptedReply, TokenUsage, UsageTracker,
};
pub use pipeline::{
    CitationSet, PipelineState, ResearchConfig, ResearchPipeline, ResearchReport, Stage,
    StageTransition, StateDelta, WorkflowState,
};
pub use rag::{AgenticRag, CritiqueResult, RagConfig, RagOutcome, RagPhase, RagState};
pub use retrieval::{Retriever, SearchResult, StaticRetriever, SyntheticRetriever};
pub use review::{Document, DocumentReview, DocumentReviewer};
