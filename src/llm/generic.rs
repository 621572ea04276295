//! Generic HTTP provider: `{"prompt": …}` in, heterogeneous JSON out.
//!
//! Gateways in front of non-OpenAI models disagree about where the generated
//! text lives in the response body. Rather than hard-coding one vendor's
//! contract, the response is probed against an explicit ordered list of
//! known shapes — each matcher a pure function from parsed body to optional
//! text, tried in priority order, stopping at the first match. When nothing
//! matches, the raw body text is used verbatim: downstream JSON recovery is
//! resilient enough to dig a record out of almost anything.

use crate::config::ExtractionConfig;
use crate::error::LlmFailure;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::LlmProvider;

/// Generic HTTP JSON provider with bearer-token authorisation.
pub struct GenericProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl GenericProvider {
    /// Build from configuration. Both the endpoint URL and the API key are
    /// required — there is no sensible default for an arbitrary gateway.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, LlmFailure> {
        let not_configured = |detail: &str| LlmFailure::NotConfigured {
            provider: "generic".into(),
            detail: detail.into(),
        };

        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| not_configured("endpoint URL must be set"))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| not_configured("api key must be set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| LlmFailure::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout_secs: config.api_timeout_secs,
        })
    }
}

#[async_trait]
impl LlmProvider for GenericProvider {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmFailure::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    LlmFailure::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmFailure::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = extract_completion_text(&body);
        debug!(chars = text.len(), "generic completion received");
        Ok(text)
    }
}

// ── Response-shape probing ───────────────────────────────────────────────

type ShapeMatcher = fn(&Value) -> Option<String>;

/// Known response shapes, in priority order.
const RESPONSE_SHAPES: &[(&str, ShapeMatcher)] = &[
    ("candidates", shape_candidates),
    ("output", shape_output),
    ("output_text", shape_output_text),
    ("outputs", shape_outputs),
];

/// Pull the completion text out of a response body.
///
/// A non-JSON body, or a JSON body matching none of the known shapes, is
/// returned verbatim.
pub fn extract_completion_text(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        for (name, matcher) in RESPONSE_SHAPES {
            if let Some(text) = matcher(&parsed) {
                debug!(shape = name, "matched response shape");
                return text;
            }
        }
    }
    body.to_string()
}

/// `{"candidates": [{"content": "…"}, …]}`
fn shape_candidates(body: &Value) -> Option<String> {
    body.get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// `{"output": "…"}`
fn shape_output(body: &Value) -> Option<String> {
    body.get("output")?.as_str().map(str::to_string)
}

/// `{"output_text": "…"}`
fn shape_output_text(body: &Value) -> Option<String> {
    body.get("output_text")?.as_str().map(str::to_string)
}

/// `{"outputs": [{"text": "…"} | {"content": "…"}, …]}` — first entry that
/// carries either key wins.
fn shape_outputs(body: &Value) -> Option<String> {
    body.get("outputs")?.as_array()?.iter().find_map(|o| {
        o.get("text")
            .or_else(|| o.get("content"))?
            .as_str()
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_shape_wins() {
        let body = r#"{"candidates":[{"content":"from candidates"}],"output":"from output"}"#;
        assert_eq!(extract_completion_text(body), "from candidates");
    }

    #[test]
    fn output_shape() {
        assert_eq!(extract_completion_text(r#"{"output":"plain"}"#), "plain");
    }

    #[test]
    fn output_text_shape() {
        assert_eq!(
            extract_completion_text(r#"{"output_text":"text form"}"#),
            "text form"
        );
    }

    #[test]
    fn outputs_list_prefers_text_then_content() {
        let body = r#"{"outputs":[{"meta":1},{"content":"second"},{"text":"third"}]}"#;
        assert_eq!(extract_completion_text(body), "second");
    }

    #[test]
    fn empty_candidates_falls_through() {
        let body = r#"{"candidates":[],"output":"fallback shape"}"#;
        assert_eq!(extract_completion_text(body), "fallback shape");
    }

    #[test]
    fn unknown_json_returns_body_verbatim() {
        let body = r#"{"result":{"deep":"value"}}"#;
        assert_eq!(extract_completion_text(body), body);
    }

    #[test]
    fn non_json_returns_body_verbatim() {
        let body = "500 upstream timeout (not json)";
        assert_eq!(extract_completion_text(body), body);
    }
}
