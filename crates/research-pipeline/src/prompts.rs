//! Prompt templates for the pipeline stages
//!
//! Each builder returns the full conversation for one completion call:
//! a system message carrying the instructions and a user message carrying
//! the data.

use chrono::Utc;

use crate::llm::Message;
use crate::retrieval::SearchResult;

/// Prompt templates for every stage
pub struct Prompts;

impl Prompts {
    fn current_date() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    /// Number each hit as `[i] title (url)` followed by its snippet.
    pub fn format_results(results: &[SearchResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {} ({})\n{}", i + 1, r.title, r.url, r.snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Decompose the query into 3-5 search queries, returned as a JSON array.
    pub fn plan(query: &str) -> Vec<Message> {
        vec![
            Message::system(format!(
                r#"You are a research planner. Today's date is {date}.

Break the user's research question into 3-5 concrete, self-contained web search queries.
Each query should target one specific aspect of the question.

Respond with ONLY a JSON array of strings, for example:
["first search query", "second search query", "third search query"]"#,
                date = Self::current_date()
            )),
            Message::user(format!("Research question: {}", query)),
        ]
    }

    /// Pull bullet-point facts with source attribution out of search hits.
    pub fn extract(query: &str, results: &[SearchResult]) -> Vec<Message> {
        vec![
            Message::system(
                r#"You extract facts from search results.

For every relevant fact, write one bullet point on its own line and end it with the
source number in brackets, e.g.:
- Rust 1.75 stabilised async fn in traits [2]

Only state what the results support. Skip results that are irrelevant to the question."#,
            ),
            Message::user(format!(
                "Question: {}\n\nSearch results:\n\n{}",
                query,
                Self::format_results(results)
            )),
        ]
    }

    /// Write the cited report from the extracted facts.
    pub fn synthesize(query: &str, extracted_info: &[String]) -> Vec<Message> {
        vec![
            Message::system(
                r#"You are a research writer. Write a clear, well-structured report answering the question
using only the provided facts.

Citation format:
- Cite sources inline using [1], [2], [3]
- Assign each unique URL a single citation number
- End with a ### Sources section listing one source per line as: [n] Title - URL

Do NOT use self-referential language ("I found...", "I researched...")."#,
            ),
            Message::user(format!(
                "Question: {}\n\nFacts:\n{}",
                query,
                extracted_info.join("\n")
            )),
        ]
    }

    /// Answer strictly from the retrieved context.
    pub fn generate(query: &str, context: &[SearchResult]) -> Vec<Message> {
        vec![
            Message::system(
                r#"Answer the question using ONLY the numbered context passages.

Rules:
- Every claim must be supported by the context; never add outside knowledge
- Cite passages inline with their numbers, e.g. [1], [2]
- If the context does not contain the answer, say so plainly"#,
            ),
            Message::user(format!(
                "Context:\n\n{}\n\nQuestion: {}",
                Self::format_results(context),
                query
            )),
        ]
    }

    /// Judge an answer against the context it was generated from.
    pub fn critique(query: &str, answer: &str, context: &[SearchResult]) -> Vec<Message> {
        vec![
            Message::system(
                r#"You review answers for grounding and completeness.

Check whether every claim in the answer is supported by the context, whether the
question is fully answered, and whether citations point at the right passages.

Respond with ONLY a JSON object:
{"satisfactory": true or false, "confidence": number between 0 and 1, "feedback": "what is missing or unsupported"}"#,
            ),
            Message::user(format!(
                "Question: {}\n\nContext:\n\n{}\n\nAnswer:\n{}",
                query,
                Self::format_results(context),
                answer
            )),
        ]
    }

    /// Review a single document.
    pub fn review(title: &str, body: &str) -> Vec<Message> {
        vec![
            Message::system(
                r#"You review documents. Summarise the document in two sentences, then list
concrete issues (errors, gaps, unclear passages) as bullet points."#,
            ),
            Message::user(format!("Document: {}\n\n{}", title, body)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_plan_prompt_contains_query_and_date() {
        let messages = Prompts::plan("What is Rust?");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("JSON array"));
        assert!(messages[0].content.contains(&Prompts::current_date()));
        assert!(messages[1].content.contains("What is Rust?"));
    }

    #[test]
    fn test_synthesize_prompt_asks_for_sources_section() {
        let messages = Prompts::synthesize("q", &["- fact [1]".to_string()]);

        assert!(messages[0].content.contains("### Sources"));
        assert!(messages[0].content.contains("[n] Title - URL"));
        assert!(messages[1].content.contains("- fact [1]"));
    }

    #[test]
    fn test_format_results_numbering() {
        let results = vec![
            SearchResult::new("A", "https://a.com", "alpha"),
            SearchResult::new("B", "https://b.com", "beta"),
        ];

        let formatted = Prompts::format_results(&results);

        assert!(formatted.contains("[1] A (https://a.com)\nalpha"));
        assert!(formatted.contains("[2] B (https://b.com)\nbeta"));
    }

    #[test]
    fn test_critique_prompt_carries_answer_and_context() {
        let context = vec![SearchResult::new("Doc", "https://d.com", "facts")];
        let messages = Prompts::critique("q", "the answer [1]", &context);

        assert!(messages[0].content.contains("\"satisfactory\""));
        assert!(messages[1].content.contains("the answer [1]"));
        assert!(messages[1].content.contains("https://d.com"));
    }
}
