//! Configuration types for marksheet extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads and to diff two runs to
//! understand why their outputs differ.
//!
//! Provider selection and credentials live here and nowhere else — nothing in
//! the pipeline reads the process environment. The CLI maps environment
//! variables onto this struct at the boundary (via clap's `env` attribute),
//! which keeps the algorithmic code deterministic under test.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for a marksheet extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use marksheet_extract::{ExtractionConfig, ProviderKind};
///
/// let config = ExtractionConfig::builder()
///     .provider(ProviderKind::Chat)
///     .api_key("sk-…")
///     .model("gpt-4o-mini")
///     .ocr_concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Which LLM provider family to call. Default: [`ProviderKind::Chat`].
    pub provider: ProviderKind,

    /// Bearer credential for the selected provider.
    ///
    /// Both provider families refuse to run without one; the parser then
    /// returns the degraded record rather than erroring, so a missing key
    /// degrades output quality but never takes the pipeline down.
    pub api_key: Option<String>,

    /// Model identifier sent to the chat provider. If `None`, `gpt-4o-mini`
    /// is used. Ignored by the generic provider (the endpoint implies it).
    pub model: Option<String>,

    /// Provider endpoint URL.
    ///
    /// Required for the generic provider — there is no sensible default for
    /// an arbitrary HTTP JSON service. For the chat provider this overrides
    /// the standard chat-completions URL, which is how self-hosted
    /// OpenAI-compatible gateways are reached.
    pub endpoint: Option<String>,

    /// OCR engine executable. Default: `tesseract`.
    ///
    /// A bare command name resolves through `PATH`; an absolute path pins a
    /// specific build (the original deployments used this to ship their own
    /// tesseract alongside the service).
    pub ocr_cmd: String,

    /// Language(s) passed to the OCR engine, e.g. `eng` or `eng+hin`.
    /// Default: `eng`.
    pub ocr_language: String,

    /// Number of pages OCRed concurrently. Default: 4.
    ///
    /// Each page costs two OCR engine processes; on typical marksheets
    /// (1–3 pages) this bound is rarely hit, but batch callers feeding long
    /// PDFs need it to keep process fan-out sane.
    pub ocr_concurrency: usize,

    /// Maximum rendered page dimension (width or height) in pixels.
    /// Default: 2000.
    ///
    /// Caps pdfium's output regardless of physical page size so an oversized
    /// scan cannot exhaust memory. 2000 px keeps 10–12 pt print comfortably
    /// above the engine's recognition floor.
    pub target_pixels: u32,

    /// Per-provider-call timeout in seconds. Default: 30.
    ///
    /// The provider call is the pipeline's only external I/O suspension
    /// point; this bound guarantees the pipeline never blocks indefinitely
    /// on a wedged endpoint.
    pub api_timeout_secs: u64,

    /// Confidence blend weights. Default: 0.6 model / 0.4 OCR.
    pub fusion: FusionWeights,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: None,
            endpoint: None,
            ocr_cmd: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            ocr_concurrency: 4,
            target_pixels: 2000,
            api_timeout_secs: 30,
            fusion: FusionWeights::default(),
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("ocr_cmd", &self.ocr_cmd)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_concurrency", &self.ocr_concurrency)
            .field("target_pixels", &self.target_pixels)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("fusion", &self.fusion)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    pub fn ocr_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.ocr_cmd = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_concurrency(mut self, n: usize) -> Self {
        self.config.ocr_concurrency = n.max(1);
        self
    }

    pub fn target_pixels(mut self, px: u32) -> Self {
        self.config.target_pixels = px.clamp(500, 8000);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn fusion(mut self, weights: FusionWeights) -> Self {
        self.config.fusion = weights;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.ocr_cmd.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "OCR command must not be empty".into(),
            ));
        }
        if c.ocr_concurrency == 0 {
            return Err(ExtractError::InvalidConfig(
                "OCR concurrency must be ≥ 1".into(),
            ));
        }
        c.fusion.validate()?;
        Ok(self.config)
    }
}

// ── Enums & weights ──────────────────────────────────────────────────────

/// Which LLM provider family structures the OCR text.
///
/// Exactly one provider is invoked per extraction; there is no fallback
/// chain. Two families cover the deployments we have seen:
///
/// | Kind | Wire contract |
/// |------|---------------|
/// | `Chat` | OpenAI-style chat-completions: role/content messages + model name |
/// | `Generic` | Single POST of `{"prompt": …}` with bearer auth; response shape probed |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat-completions endpoint. (default)
    #[default]
    Chat,
    /// Generic HTTP JSON endpoint with heterogeneous response shapes.
    Generic,
}

impl FromStr for ProviderKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" | "openai" => Ok(ProviderKind::Chat),
            "generic" | "gemini" => Ok(ProviderKind::Generic),
            other => Err(ExtractError::InvalidConfig(format!(
                "unknown provider '{other}' (expected 'chat' or 'generic')"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Chat => write!(f, "chat"),
            ProviderKind::Generic => write!(f, "generic"),
        }
    }
}

/// Weights for blending model-reported and OCR-derived confidence.
///
/// `final = round(model_weight·model_conf + ocr_weight·ocr_conf, 3)`.
/// The 0.6/0.4 default came out of manual calibration on board marksheets;
/// the weights are a constructor parameter (not runtime-mutable) so a run's
/// scores are internally consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub model: f64,
    pub ocr: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            model: 0.6,
            ocr: 0.4,
        }
    }
}

impl FusionWeights {
    /// Weights must each sit in `[0, 1]` and sum into `(0, 1]` so the blended
    /// confidence can never leave `[0, 1]`.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let in_range = |w: f64| (0.0..=1.0).contains(&w);
        if !in_range(self.model) || !in_range(self.ocr) {
            return Err(ExtractError::InvalidConfig(format!(
                "fusion weights must be in [0, 1], got {}/{}",
                self.model, self.ocr
            )));
        }
        let sum = self.model + self.ocr;
        if sum <= 0.0 || sum > 1.0 + 1e-9 {
            return Err(ExtractError::InvalidConfig(format!(
                "fusion weights must sum into (0, 1], got {sum}"
            )));
        }
        Ok(())
    }
}
