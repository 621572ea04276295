//! LLM provider abstraction.
//!
//! The structured parser talks to exactly one provider per call, selected by
//! [`ProviderKind`](crate::config::ProviderKind) in the configuration — no
//! fallback chain between providers. The trait seam exists so tests can
//! substitute a canned provider and so the two wire contracts we support
//! ([`ChatProvider`] and [`GenericProvider`]) stay interchangeable behind
//! one call site.
//!
//! Construction failures (missing key, missing endpoint) surface as
//! [`LlmFailure::NotConfigured`] rather than panics or fatal errors: the
//! parser folds them into the degraded record like any other provider
//! failure.

use crate::config::{ExtractionConfig, ProviderKind};
use crate::error::LlmFailure;
use async_trait::async_trait;

pub mod chat;
pub mod generic;

pub use chat::ChatProvider;
pub use generic::GenericProvider;

/// A text-completion capability: prompt in, model text out.
///
/// Implementations own their HTTP client and credentials; `complete` must
/// not hold any exclusive resource while suspended on the network.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Send the prompt and return the model's raw text output.
    async fn complete(&self, prompt: &str) -> Result<String, LlmFailure>;
}

/// Instantiate the provider selected by the configuration.
pub fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<Box<dyn LlmProvider>, LlmFailure> {
    match config.provider {
        ProviderKind::Chat => Ok(Box::new(ChatProvider::from_config(config)?)),
        ProviderKind::Generic => Ok(Box::new(GenericProvider::from_config(config)?)),
    }
}
