//! Top-level extraction entry points.
//!
//! The pipeline is a straight line with no feedback loop: token extraction
//! must finish before structured parsing starts (the parser consumes the
//! raw text), and parsing must finish before fusion starts (fusion consumes
//! the parser's record). Each request owns all of its intermediate state —
//! token list, structured record, scratch files — so concurrent extractions
//! are independent without any locking.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::{fuse, input, ocr, parse, render};
use crate::schema::MarksheetOutput;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract structured marksheet data from a PDF or raster-image document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_path` — Local path to a PDF, PNG, or JPEG document
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(MarksheetOutput)` whenever any text could be recognised — including
/// when the LLM stage failed and the record is the zero-confidence degraded
/// form (check `confidence_explanation` for an `llm_error:` diagnostic
/// having been replaced by the fusion description, and field confidences
/// for the actual signal).
///
/// # Errors
/// Returns `Err(ExtractError)` only when no meaningful output is possible:
/// - File not found / permission denied / unsupported format
/// - The document could not be rasterised
/// - The OCR engine is unavailable or its text pass failed
pub async fn extract(
    input_path: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<MarksheetOutput, ExtractError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    info!("Starting extraction: {}", input_path);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let (path, kind) = input::resolve_document(input_path)?;

    // ── Step 2: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let pages = render::rasterize(&path, kind, config.target_pixels).await?;
    debug!(
        "Rasterised {} pages in {}ms",
        pages.len(),
        render_start.elapsed().as_millis()
    );

    // ── Step 3: OCR text + tokens ────────────────────────────────────────
    let ocr_start = Instant::now();
    let recognised = ocr::recognize(pages, config).await?;
    info!(
        "OCR complete: {} chars, {} tokens, {}ms",
        recognised.raw_text.len(),
        recognised.tokens.len(),
        ocr_start.elapsed().as_millis()
    );

    // ── Step 4: Structure via LLM (degrades, never fails) ────────────────
    let llm_start = Instant::now();
    let mut record = parse::parse_structured(&recognised.raw_text, config).await;
    debug!(
        "Structured parse done in {}ms",
        llm_start.elapsed().as_millis()
    );

    // ── Step 5: Fuse confidences ─────────────────────────────────────────
    fuse::fuse_confidences(&mut record, &recognised.tokens, config.fusion);

    info!(
        "Extraction complete: {} subjects, {}ms total",
        record.subjects.len(),
        total_start.elapsed().as_millis()
    );

    Ok(record)
}

/// Extract from document bytes in memory.
///
/// Avoids the need for the caller to create a temporary file — the bytes
/// are written to a managed [`tempfile`] that is cleaned up automatically
/// on return or panic. This is the natural API for upload handlers, which
/// hold the document as a request body rather than a path.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<MarksheetOutput, ExtractError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_path: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<MarksheetOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(input_path, config))
}

/// Extract and write the record as JSON directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_path: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<MarksheetOutput, ExtractError> {
    let record = extract(input_path, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| ExtractError::Internal(format!("serialise record: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_is_fatal() {
        let config = ExtractionConfig::default();
        let err = extract("/no/such/marksheet.pdf", &config).await;
        assert!(matches!(err, Err(ExtractError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn unsupported_bytes_are_fatal() {
        let config = ExtractionConfig::default();
        let err = extract_from_bytes(b"plain text, not a document", &config).await;
        assert!(matches!(err, Err(ExtractError::UnsupportedFormat { .. })));
    }
}
