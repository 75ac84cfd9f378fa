//! Retrieval collaborator
//!
//! The pipelines only see the [`Retriever`] trait. Two deterministic
//! implementations ship with the crate: [`StaticRetriever`] ranks a fixed
//! corpus by term overlap, and [`SyntheticRetriever`] fabricates one
//! placeholder hit per query for offline demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A single retrieval hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Retrieval capability.
///
/// No contract on result count or ordering beyond "most relevant first is
/// preferred". Implementations must be safe to call concurrently.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>>;

    fn name(&self) -> &str {
        "retriever"
    }
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for std::sync::Arc<R> {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.as_ref().retrieve(query).await
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }
}

/// Ranks a fixed corpus by how many query terms each document contains.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    corpus: Vec<SearchResult>,
    top_k: usize,
}

impl StaticRetriever {
    pub fn new(corpus: Vec<SearchResult>) -> Self {
        Self { corpus, top_k: 5 }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    fn score(doc: &SearchResult, terms: &[String]) -> usize {
        let haystack = format!("{} {}", doc.title, doc.snippet).to_lowercase();
        terms.iter().filter(|t| haystack.contains(t.as_str())).count()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let terms: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(str::to_lowercase)
            .collect();

        let mut scored: Vec<(usize, usize, &SearchResult)> = self
            .corpus
            .iter()
            .enumerate()
            .map(|(i, doc)| (Self::score(doc, &terms), i, doc))
            .filter(|(score, _, _)| *score > 0)
            .collect();

        // Highest score first; corpus order breaks ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let results: Vec<SearchResult> = scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, _, doc)| doc.clone())
            .collect();

        debug!(query = %query, hits = results.len(), "Static retrieval");
        Ok(results)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Returns one synthetic hit per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticRetriever;

#[async_trait]
impl Retriever for SyntheticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let slug: String = query
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        Ok(vec![SearchResult::new(
            format!("Result for: {}", query),
            format!("https://example.com/search/{}", slug),
            format!("Mock search result snippet about {}", query),
        )])
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<SearchResult> {
        vec![
            SearchResult::new("Tokio runtime", "https://tokio.rs", "Async runtime for Rust"),
            SearchResult::new("Serde", "https://serde.rs", "Serialization framework for Rust"),
            SearchResult::new("Cooking", "https://food.example", "Pasta recipes"),
        ]
    }

    #[tokio::test]
    async fn test_static_retriever_ranks_by_overlap() {
        let retriever = StaticRetriever::new(corpus());

        let results = retriever.retrieve("Rust async runtime").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://tokio.rs");
        assert_eq!(results[1].url, "https://serde.rs");
    }

    #[tokio::test]
    async fn test_static_retriever_top_k() {
        let retriever = StaticRetriever::new(corpus()).with_top_k(1);
        let results = retriever.retrieve("rust").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_static_retriever_no_match() {
        let retriever = StaticRetriever::new(corpus());
        assert!(retriever.retrieve("quantum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_synthetic_retriever() {
        let results = SyntheticRetriever.retrieve("AI agents 2024?").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/search/ai-agents-2024");
        assert!(results[0].snippet.contains("AI agents 2024?"));
    }

    #[test]
    fn test_retriever_behind_arc() {
        let retriever: std::sync::Arc<dyn Retriever> = std::sync::Arc::new(SyntheticRetriever);

        let results = tokio_test::block_on(retriever.retrieve("rust")).unwrap();

        assert_eq!(results[0].url, "https://example.com/search/rust");
        assert_eq!(retriever.name(), "synthetic");
    }
}
