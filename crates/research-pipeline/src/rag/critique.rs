//! Critique stage
//!
//! Asks the model to judge an answer against its context and parses the
//! verdict out of whatever the model returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider, TokenUsage};
use crate::parse::{self, Parsed};
use crate::prompts::Prompts;
use crate::retrieval::SearchResult;

const FALLBACK_CONFIDENCE: f64 = 0.7;
const FALLBACK_FEEDBACK: &str = "unable to parse critique";

/// Verdict on one generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    pub satisfactory: bool,
    /// Always within `[0, 1]`
    pub confidence: f64,
    pub feedback: String,
}

impl Default for CritiqueResult {
    fn default() -> Self {
        Self {
            satisfactory: true,
            confidence: FALLBACK_CONFIDENCE,
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }
}

impl CritiqueResult {
    pub fn new(satisfactory: bool, confidence: f64, feedback: impl Into<String>) -> Self {
        Self {
            satisfactory,
            confidence: clamp_confidence(confidence),
            feedback: feedback.into(),
        }
    }

    /// Parse the first JSON object in `text`.
    ///
    /// Missing or mistyped fields fall back to their defaults individually;
    /// no object at all yields [`Parsed::Default`].
    pub fn parse(text: &str) -> Parsed<Self> {
        let Some(object) = parse::json_object(text) else {
            return Parsed::Default(Self::default());
        };

        let fallback = Self::default();
        let satisfactory = object
            .get("satisfactory")
            .and_then(Value::as_bool)
            .unwrap_or(fallback.satisfactory);
        let confidence = object
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(fallback.confidence);
        let feedback = object
            .get("feedback")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or(fallback.feedback);

        Parsed::Value(Self::new(satisfactory, confidence, feedback))
    }

    /// `satisfactory && confidence >= threshold`
    pub fn passes(&self, threshold: f64) -> bool {
        self.satisfactory && self.confidence >= threshold
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return FALLBACK_CONFIDENCE;
    }
    confidence.clamp(0.0, 1.0)
}

/// Run the critique completion and parse its verdict.
pub async fn critique(
    llm: &dyn LLMProvider,
    config: &LLMConfig,
    query: &str,
    answer: &str,
    context: &[SearchResult],
) -> Result<(CritiqueResult, Option<TokenUsage>)> {
    let messages = Prompts::critique(query, answer, context);
    let response = llm.complete(&messages, Some(config)).await?;

    let parsed = CritiqueResult::parse(&response.content);
    if parsed.is_default() {
        warn!("Critique output had no JSON object, using default verdict");
    }
    let verdict = parsed.into_inner();
    debug!(
        satisfactory = verdict.satisfactory,
        confidence = verdict.confidence,
        "Critique parsed"
    );

    Ok((verdict, response.usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;

    #[test]
    fn test_parse_strict_json() {
        let parsed = CritiqueResult::parse(
            r#"{"satisfactory": false, "confidence": 0.4, "feedback": "missing dates"}"#,
        );

        assert!(!parsed.is_default());
        assert_eq!(
            parsed.into_inner(),
            CritiqueResult::new(false, 0.4, "missing dates")
        );
    }

    #[test]
    fn test_parse_embedded_object() {
        let text = "Verdict follows.\n```json\n{\"satisfactory\": true, \"confidence\": 0.92, \"feedback\": \"ok\"}\n```";
        let verdict = CritiqueResult::parse(text).into_inner();

        assert!(verdict.satisfactory);
        assert!((verdict.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_fallback() {
        let parsed = CritiqueResult::parse("Looks fine to me.");

        assert!(parsed.is_default());
        let verdict = parsed.into_inner();
        assert!(verdict.satisfactory);
        assert!((verdict.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(verdict.feedback, "unable to parse critique");
    }

    #[test]
    fn test_confidence_clamped() {
        let high = CritiqueResult::parse(r#"{"satisfactory": true, "confidence": 1.7}"#).into_inner();
        let low = CritiqueResult::parse(r#"{"satisfactory": true, "confidence": -3}"#).into_inner();

        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let verdict = CritiqueResult::parse(r#"{"satisfactory": false}"#).into_inner();

        assert!(!verdict.satisfactory);
        assert!((verdict.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_passes_threshold() {
        assert!(CritiqueResult::new(true, 0.8, "").passes(0.8));
        assert!(!CritiqueResult::new(true, 0.79, "").passes(0.8));
        assert!(!CritiqueResult::new(false, 0.95, "").passes(0.8));
    }

    #[tokio::test]
    async fn test_critique_stage_uses_provider() {
        let llm = ScriptedProvider::from_texts([r#"{"satisfactory": true, "confidence": 0.9, "feedback": "good"}"#]);

        let (verdict, _) = critique(&llm, &LLMConfig::default(), "q", "a [1]", &[])
            .await
            .unwrap();

        assert!(verdict.passes(0.8));
        assert_eq!(llm.call_count(), 1);
    }
}
