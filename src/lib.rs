//! # marksheet-extract
//!
//! Extract structured data from scanned academic marksheets — candidate
//! identity fields, subject marks, overall result — with a per-field
//! confidence score in `[0, 1]`.
//!
//! ## Why this crate?
//!
//! Neither signal alone is trustworthy. OCR engines read pixels faithfully
//! but have no idea which smudge is a roll number; LLMs structure text
//! fluently but happily invent values the page never showed. This crate
//! runs both and fuses their confidence: every field's score blends what
//! the model claimed with how well the field's words actually match what
//! the OCR engine saw on the page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input   validate path, sniff PDF vs raster format
//!  ├─ 2. Render  rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. OCR     tesseract per page: text pass + TSV word-confidence pass
//!  ├─ 4. Parse   LLM structures the raw text into the marksheet schema,
//!  │             degrading to a zero-confidence record on any failure
//!  └─ 5. Fuse    final = round(0.6·model_conf + 0.4·ocr_conf, 3) per field
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marksheet_extract::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let record = extract("marksheet.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `marksheet-extract` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! marksheet-extract = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! The output is always a fully-populated [`MarksheetOutput`] — every field
//! present, at worst `(None, 0.0)` — except when the document itself cannot
//! be read or recognised, in which case `extract` returns an
//! [`ExtractError`] rather than fabricating a result with no text behind it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, FusionWeights, ProviderKind};
pub use error::{ExtractError, LlmFailure};
pub use extract::{extract, extract_from_bytes, extract_sync, extract_to_file};
pub use schema::{CandidateDetails, FieldValue, MarksheetOutput, SubjectMark, Token};
