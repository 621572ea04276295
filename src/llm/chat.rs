//! Chat-completion provider: OpenAI-style messages API.
//!
//! The request is the standard chat-completions shape — a model name plus
//! system/user messages — and the response is read from the first choice's
//! message content. Temperature is pinned at 0.0: extraction wants the most
//! literal reading of the OCR text, not creativity.

use crate::config::ExtractionConfig;
use crate::error::LlmFailure;
use crate::prompts::SYSTEM_PROMPT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::LlmProvider;

/// Standard chat-completions endpoint used when no override is configured.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Completion budget for one marksheet. Structured records for even dense
/// multi-subject sheets fit well under this.
const MAX_COMPLETION_TOKENS: u32 = 1500;

/// OpenAI-compatible chat-completions provider.
pub struct ChatProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl ChatProvider {
    /// Build from configuration. Requires an API key; the endpoint and model
    /// fall back to the OpenAI defaults.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, LlmFailure> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmFailure::NotConfigured {
                provider: "chat".into(),
                detail: "api key must be set".into(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| LlmFailure::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_string()),
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs: config.api_timeout_secs,
        })
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmFailure> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
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
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmFailure::Request(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmFailure::EmptyResponse)?;

        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
