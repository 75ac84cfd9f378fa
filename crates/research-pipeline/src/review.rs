//! Multi-document review
//!
//! Reviews share no state, so they fan out concurrently. Results come back
//! in input order whatever order the completions finish in.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider, TokenUsage};
use crate::prompts::Prompts;

/// A document to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub body: String,
}

impl Document {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Review of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReview {
    pub title: String,
    pub review: String,
    pub usage: TokenUsage,
}

/// Fans reviews out over a shared provider.
pub struct DocumentReviewer {
    llm: Arc<dyn LLMProvider>,
    config: LLMConfig,
    concurrency: usize,
}

impl DocumentReviewer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            llm,
            config: LLMConfig::sampling(0.2, 800),
            concurrency: 4,
        }
    }

    pub fn with_config(mut self, config: LLMConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn review(&self, document: &Document) -> Result<DocumentReview> {
        let messages = Prompts::review(&document.title, &document.body);
        let response = self.llm.complete(&messages, Some(&self.config)).await?;
        debug!(title = %document.title, chars = response.content.len(), "Document reviewed");

        Ok(DocumentReview {
            title: document.title.clone(),
            review: response.content,
            usage: response.usage.unwrap_or_default(),
        })
    }

    /// Review every document. The first failure aborts the batch.
    pub async fn review_all(&self, documents: &[Document]) -> Result<Vec<DocumentReview>> {
        info!(documents = documents.len(), concurrency = self.concurrency, "Reviewing documents");

        let reviews: Vec<_> = documents.iter().map(|doc| self.review(doc)).collect();
        futures::stream::iter(reviews)
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::{LLMResponse, Message, ScriptedProvider};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes the document title; longer titles answer sooner.
    struct TitleEcho;

    #[async_trait]
    impl LLMProvider for TitleEcho {
        async fn complete(
            &self,
            messages: &[Message],
            _config: Option<&LLMConfig>,
        ) -> Result<LLMResponse> {
            let user = &messages[1].content;
            let title = user
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("Document: ")
                .to_string();
            let delay = 40u64.saturating_sub(title.len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(LLMResponse::new(format!("review of {}", title)))
        }

        fn name(&self) -> &str {
            "title-echo"
        }
    }

    #[tokio::test]
    async fn test_review_all_keeps_input_order() {
        let reviewer = DocumentReviewer::new(Arc::new(TitleEcho)).with_concurrency(3);
        let docs = vec![
            Document::new("a", "first"),
            Document::new("bb", "second"),
            Document::new("ccc", "third"),
        ];

        let reviews = reviewer.review_all(&docs).await.unwrap();

        let titles: Vec<_> = reviews.iter().map(|r| r.review.as_str()).collect();
        assert_eq!(titles, vec!["review of a", "review of bb", "review of ccc"]);
    }

    #[tokio::test]
    async fn test_review_failure_propagates() {
        let llm = ScriptedProvider::new()
            .with_text("ok")
            .with_failure(PipelineError::permanent("boom"));
        let reviewer = DocumentReviewer::new(Arc::new(llm)).with_concurrency(1);
        let docs = vec![Document::new("a", "x"), Document::new("b", "y")];

        assert!(reviewer.review_all(&docs).await.is_err());
    }

    #[tokio::test]
    async fn test_review_all_on_spawned_task() {
        let reviewer = DocumentReviewer::new(Arc::new(TitleEcho)).with_concurrency(2);
        let docs = vec![Document::new("a", "x"), Document::new("bb", "y")];

        let reviews = tokio::spawn(async move { reviewer.review_all(&docs).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].review, "review of bb");
    }

    #[tokio::test]
    async fn test_review_all_empty() {
        let reviewer = DocumentReviewer::new(Arc::new(ScriptedProvider::new()));
        assert!(reviewer.review_all(&[]).await.unwrap().is_empty());
    }
}
