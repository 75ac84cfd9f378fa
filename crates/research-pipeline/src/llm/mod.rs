//! LLM Provider abstractions
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   ResearchPipeline / AgenticRag          │
//! └─────────────────┬───────────────────────┘
//!                   │ Arc<dyn LLMProvider>
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │  UsageTracker<RetryingProvider<...>>    │  optional decorators
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │  RigAgentAdapter  |  ScriptedProvider   │
//! └─────────────────────────────────────────┘
//! ```

mod config;
mod message;
mod provider;
mod retry;
mod rig_adapter;
mod scripted;
mod usage;

pub use config::{LLMConfig, TokenUsage};
pub use message::{extract_system_preamble, Message, Role};
pub use provider::{LLMProvider, LLMResponse};
pub use retry::{RetryPolicy, RetryingProvider};
pub use rig_adapter::RigAgentAdapter;
pub use scripted::{ScriptedProvider, ScriptedReply};
pub use usage::UsageTracker;
