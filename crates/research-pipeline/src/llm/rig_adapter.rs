//! Adapter for using Rig Agents as an [`LLMProvider`]
//!
//! Rig agents carry their own preamble and model. The adapter forwards the
//! pipeline's conversation through Rig's completion API: system messages
//! are appended to the agent preamble, the last message becomes the prompt
//! and everything before it becomes chat history.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rig::client::{CompletionClient, ProviderClient};
//! use rig::providers::ollama;
//! use research_pipeline::llm::RigAgentAdapter;
//!
//! let client = ollama::Client::from_env();
//! let agent = client.agent("llama3.2").build();
//! let provider = RigAgentAdapter::with_names(agent, "ollama", "llama3.2");
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::{Completion, CompletionModel, Message as RigMessage};
use rig::message::AssistantContent;
use rig::OneOrMany;

use super::config::{LLMConfig, TokenUsage};
use super::message::{extract_system_preamble, Message, Role};
use super::provider::{LLMProvider, LLMResponse};
use crate::error::{PipelineError, Result};

/// Adapter that wraps a Rig `Agent<M>` to implement [`LLMProvider`].
pub struct RigAgentAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    agent: Arc<Agent<M>>,
    provider_name: String,
    model_name: String,
}

impl<M> RigAgentAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    pub fn new(agent: Agent<M>) -> Self {
        Self::with_names(agent, "rig", "rig-agent")
    }

    /// Create adapter with custom provider/model names for logging.
    pub fn with_names(
        agent: Agent<M>,
        provider_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            agent: Arc::new(agent),
            provider_name: provider_name.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl<M> LLMProvider for RigAgentAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    async fn complete(
        &self,
        messages: &[Message],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse> {
        let conversation = build_rig_conversation(messages);
        let mut builder = self
            .agent
            .completion(conversation.prompt, conversation.history)
            .await
            .map_err(|e| PipelineError::permanent(format!("Rig agent error: {}", e)))?;

        if let Some(system_preamble) = conversation.preamble {
            let preamble = match self.agent.preamble.as_deref() {
                Some(agent_preamble) => format!("{}\n\n{}", agent_preamble, system_preamble),
                None => system_preamble,
            };
            builder = builder.preamble(preamble);
        }

        if let Some(cfg) = config {
            if let Some(temperature) = cfg.temperature {
                builder = builder.temperature(temperature);
            }
            if let Some(max_tokens) = cfg.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
        }

        // Transport-level failures from the provider are treated as transient;
        // a retry layer decides whether to try again.
        let response = builder
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("Rig agent error: {}", e)))?;

        let content = text_from_rig_choice(&response.choice);
        let usage = TokenUsage::from_rig_usage(&response.usage);

        let mut llm_response = LLMResponse::new(content);
        if usage.total_tokens > 0 {
            llm_response = llm_response.with_usage(usage);
        }

        Ok(llm_response)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.model_name
    }
}

struct RigConversation {
    prompt: RigMessage,
    history: Vec<RigMessage>,
    preamble: Option<String>,
}

fn build_rig_conversation(messages: &[Message]) -> RigConversation {
    let mut rig_messages: Vec<RigMessage> = messages
        .iter()
        .filter_map(|message| match message.role {
            Role::System => None,
            Role::User => Some(RigMessage::user(message.content.clone())),
            Role::Assistant => Some(RigMessage::Assistant {
                id: None,
                content: OneOrMany::one(AssistantContent::text(message.content.clone())),
            }),
        })
        .collect();

    let prompt = rig_messages.pop().unwrap_or_else(|| RigMessage::user(""));

    RigConversation {
        prompt,
        history: rig_messages,
        preamble: extract_system_preamble(messages),
    }
}

fn text_from_rig_choice(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|item| match item {
            AssistantContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl<M> std::fmt::Debug for RigAgentAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigAgentAdapter")
            .field("provider_name", &self.provider_name)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::message::UserContent;

    fn rig_message_text(message: &RigMessage) -> Option<String> {
        match message {
            RigMessage::User { content } => content.iter().find_map(|item| match item {
                UserContent::Text(text) => Some(text.text.clone()),
                _ => None,
            }),
            RigMessage::Assistant { content, .. } => content.iter().find_map(|item| match item {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            }),
        }
    }

    #[test]
    fn test_build_rig_conversation_history_and_preamble() {
        let messages = vec![
            Message::system("system rules"),
            Message::user("hello"),
            Message::assistant("hi"),
            Message::user("next"),
        ];

        let conversation = build_rig_conversation(&messages);

        assert_eq!(conversation.preamble, Some("system rules".to_string()));
        assert_eq!(conversation.history.len(), 2);
        assert_eq!(rig_message_text(&conversation.history[0]).unwrap(), "hello");
        assert_eq!(rig_message_text(&conversation.history[1]).unwrap(), "hi");
        assert_eq!(rig_message_text(&conversation.prompt).unwrap(), "next");
    }

    #[test]
    fn test_build_rig_conversation_empty() {
        let conversation = build_rig_conversation(&[]);

        assert!(conversation.preamble.is_none());
        assert!(conversation.history.is_empty());
        assert_eq!(rig_message_text(&conversation.prompt).unwrap(), "");
    }

    #[test]
    fn test_text_from_rig_choice_joins_text_parts() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Hello, "),
            AssistantContent::text("world"),
        ])
        .unwrap();

        assert_eq!(text_from_rig_choice(&choice), "Hello, world");
    }
}
