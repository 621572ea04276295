//! Structured parsing: raw OCR text → schema-conformant record via an LLM.
//!
//! This stage has one hard guarantee: it never errors to its caller. Every
//! way the provider round-trip can go wrong — missing credentials, network
//! failure, timeout, prose instead of JSON, JSON that misses the schema —
//! funnels into a single tagged [`LlmFailure`], which is converted into the
//! universal degraded record at exactly one point ([`parse_structured`]).
//! No broad error interception is scattered through the call chain; the
//! happy path is ordinary `?` propagation inside [`try_parse`].
//!
//! ## JSON recovery
//!
//! Models asked for "only valid JSON" still wrap their answer in prose or
//! code fences often enough that direct parsing is a losing strategy. The
//! recovery algorithm: trim; if the output starts with `{`, try a direct
//! parse; failing that, take the substring from the first `{` to the last
//! `}` inclusive and parse that. Anything the model wrapped around the
//! object — fences, apologies, explanations — falls away for free.

use crate::config::ExtractionConfig;
use crate::error::LlmFailure;
use crate::llm::resolve_provider;
use crate::prompts::build_prompt;
use crate::schema::MarksheetOutput;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Convert raw OCR text into a [`MarksheetOutput`].
///
/// Always returns a schema-conformant record: the model's answer when the
/// round-trip succeeds, the zero-confidence degraded record otherwise.
pub async fn parse_structured(raw_text: &str, config: &ExtractionConfig) -> MarksheetOutput {
    match try_parse(raw_text, config).await {
        Ok(record) => record,
        Err(failure) => {
            warn!(provider = %config.provider, %failure, "structured parse failed; returning degraded record");
            MarksheetOutput::degraded(raw_text, &failure.to_string())
        }
    }
}

/// The fallible inner path: provider call, recovery, deserialisation.
async fn try_parse(
    raw_text: &str,
    config: &ExtractionConfig,
) -> Result<MarksheetOutput, LlmFailure> {
    let provider = resolve_provider(config)?;
    let prompt = build_prompt(raw_text);

    // The provider call is the pipeline's single external suspension point.
    // The HTTP client carries its own timeout; this outer bound also covers
    // connection setup and body streaming so the pipeline can never hang.
    let content = tokio::time::timeout(
        Duration::from_secs(config.api_timeout_secs),
        provider.complete(&prompt),
    )
    .await
    .map_err(|_| LlmFailure::Timeout {
        secs: config.api_timeout_secs,
    })??;

    debug!(provider = provider.name(), chars = content.len(), "model output received");

    structure_output(&content)
}

/// Recover the JSON object from model text and deserialise it into the
/// output schema. Pure — the testable half of the parser.
fn structure_output(content: &str) -> Result<MarksheetOutput, LlmFailure> {
    let value = recover_json(content).ok_or(LlmFailure::NoJsonObject)?;
    serde_json::from_value(value).map_err(|e| LlmFailure::Schema(e.to_string()))
}

/// Dig a JSON object out of free-form model output.
///
/// Returns `None` when no parseable `{…}` object exists anywhere in the
/// text.
pub fn recover_json(text: &str) -> Option<Value> {
    let text = text.trim();

    if text.starts_with('{') {
        if let Ok(value) = serde_json::from_str(text) {
            return Some(value);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    #[test]
    fn direct_object_parses() {
        let v = recover_json(r#"{"overall_result":{"value":"PASS","confidence":0.9}}"#).unwrap();
        assert_eq!(v["overall_result"]["value"], "PASS");
    }

    #[test]
    fn embedded_object_parses_like_isolated_object() {
        let bare = r#"{"subjects":[],"overall_result":{"value":"PASS","confidence":0.8}}"#;
        let wrapped = format!("Sure! Here is the extracted data:\n\n{bare}\n\nLet me know if…");
        assert_eq!(recover_json(&wrapped), recover_json(bare));
    }

    #[test]
    fn fenced_object_parses() {
        let text = "```json\n{\"candidate\":{}}\n```";
        let v = recover_json(text).unwrap();
        assert!(v["candidate"].is_object());
    }

    #[test]
    fn leading_brace_with_trailing_prose_recovers_via_substring() {
        // Starts with '{' so the direct parse runs first, fails on the
        // trailing prose, and the first-to-last-brace pass rescues it.
        let text = "{\"a\": 1} — and that is everything I found.";
        let v = recover_json(text).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn no_object_recovers_nothing() {
        assert!(recover_json("I could not read this document.").is_none());
        assert!(recover_json("").is_none());
        assert!(recover_json("} backwards {").is_none());
    }

    #[test]
    fn unbalanced_braces_recover_nothing() {
        assert!(recover_json("prefix { \"a\": [1, 2 } suffix").is_none());
    }

    #[test]
    fn prose_without_json_is_a_parse_failure() {
        let err = structure_output("Sorry, the scan was unreadable.").unwrap_err();
        assert!(matches!(err, LlmFailure::NoJsonObject));
    }

    #[test]
    fn wrong_shape_is_a_schema_failure() {
        // `subjects` must be a list; a JSON object that contradicts the
        // schema fails deserialisation, not recovery.
        let err = structure_output(r#"{"subjects": "Physics, Maths"}"#).unwrap_err();
        assert!(matches!(err, LlmFailure::Schema(_)));
    }

    #[test]
    fn valid_model_output_structures_cleanly() {
        let record = structure_output(
            r#"Here you go:
            {"candidate": {"roll_no": {"value": "1024", "confidence": 0.88}},
             "subjects": [{"subject": {"value": "Physics", "confidence": 0.9},
                           "max_marks": {"value": "100", "confidence": 0.95},
                           "obtained_marks": {"value": "81", "confidence": 0.9}}],
             "overall_result": {"value": "PASS", "confidence": 0.9}}"#,
        )
        .unwrap();
        assert_eq!(record.candidate.roll_no.value.as_deref(), Some("1024"));
        assert_eq!(record.subjects.len(), 1);
        assert!(record.subjects[0].grade.is_none());
    }

    #[tokio::test]
    async fn missing_credentials_degrade_instead_of_raising() {
        // Generic provider with no endpoint/key configured: the parser must
        // return the degraded record, not an error.
        let config = ExtractionConfig::builder()
            .provider(ProviderKind::Generic)
            .build()
            .unwrap();

        let record = parse_structured("ROLL NO 1024\nPASS", &config).await;

        assert_eq!(record.raw_text.as_deref(), Some("ROLL NO 1024\nPASS"));
        assert!(record
            .confidence_explanation
            .as_deref()
            .unwrap()
            .starts_with("llm_error:"));
        assert_eq!(record.candidate.name.confidence, 0.0);
        assert!(record.subjects.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades() {
        let config = ExtractionConfig::builder()
            .provider(ProviderKind::Generic)
            .endpoint("http://127.0.0.1:9/llm") // discard port; refuses instantly
            .api_key("token")
            .api_timeout_secs(2)
            .build()
            .unwrap();

        let record = parse_structured("some text", &config).await;

        assert!(record
            .confidence_explanation
            .as_deref()
            .unwrap()
            .starts_with("llm_error:"));
        assert_eq!(record.overall_result.confidence, 0.0);
    }
}
