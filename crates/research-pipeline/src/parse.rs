//! Parsers for free-form model output
//!
//! Every parser here is total. Structured extraction is attempted first (the
//! whole text, then the first embedded literal that deserializes); when that
//! fails the caller receives the documented default wrapped in
//! [`Parsed::Default`]. Nothing in this module returns an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// `[n] ... url` on a single line.
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d+\][^\n]*?https?://[^\s)\]>]+").expect("citation pattern is valid")
});

/// Outcome of a total parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// Structured output was found and deserialized.
    Value(T),
    /// Nothing usable was found; this is the conservative default.
    Default(T),
}

impl<T> Parsed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Parsed::Value(v) | Parsed::Default(v) => v,
        }
    }

    pub fn as_inner(&self) -> &T {
        match self {
            Parsed::Value(v) | Parsed::Default(v) => v,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Parsed::Default(_))
    }
}

/// Deserialize the first `T` that starts at an `open` delimiter in `text`.
///
/// The whole (trimmed) text is tried first, then every occurrence of `open`
/// from left to right. Trailing text after a literal is ignored.
pub fn first_literal<T: DeserializeOwned>(text: &str, open: char) -> Option<T> {
    if let Ok(value) = serde_json::from_str::<T>(text.trim()) {
        return Some(value);
    }

    text.match_indices(open).find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<T>()
            .next()
            .and_then(|result| result.ok())
    })
}

/// First JSON array of strings embedded in `text`, blank entries dropped.
///
/// Arrays that contain non-string elements (such as a `[1]` citation
/// marker) are skipped and scanning continues.
pub fn string_list(text: &str) -> Option<Vec<String>> {
    first_literal::<Vec<String>>(text, '[')
        .map(|items| {
            items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
}

/// Parse a plan, falling back to the original query as the only step.
pub fn plan_or_query(text: &str, query: &str) -> Parsed<Vec<String>> {
    match string_list(text) {
        Some(plan) => Parsed::Value(plan),
        None => Parsed::Default(vec![query.to_string()]),
    }
}

/// First JSON object embedded in `text`.
pub fn json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    first_literal::<Value>(text, '{').and_then(|value| match value {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

/// Non-empty trimmed lines, passed through uninterpreted.
pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// All `[n] ... url` citation lines in order of first appearance.
///
/// Duplicates are dropped; the first occurrence keeps its position.
pub fn citations(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for found in CITATION_RE.find_iter(text) {
        let citation = found.as_str().trim().to_string();
        if !seen.contains(&citation) {
            seen.push(citation);
        }
    }
    seen
}
