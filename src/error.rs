//! Error types for the marksheet-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: no meaningful output is possible (the
//!   document cannot be read or rasterised, the OCR engine produced no text
//!   at all). Returned as `Err(ExtractError)` from the top-level `extract*`
//!   functions; fabricating a record with no text to ground it would be
//!   misleading.
//!
//! * [`LlmFailure`] — **Non-fatal**: the structured-parsing stage failed
//!   (provider unreachable, timeout, no JSON in the model output, schema
//!   mismatch). The parser converts this into the degraded zero-confidence
//!   record at exactly one point — it never crosses the library boundary as
//!   an error.
//!
//! Per-page token degradation (word-data pass failed, text pass succeeded)
//! is not an error type at all: the page keeps its text, contributes zero
//! tokens, and a `warn!` records what happened.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the marksheet-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file is neither a PDF nor a raster image this crate understands.
    #[error("Unsupported document format for '{path}'\nFirst bytes: {magic:?}\nSupported: PDF, PNG, JPEG.")]
    UnsupportedFormat { path: PathBuf, magic: [u8; 4] },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A raster image input could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error("Failed to bind to pdfium library: {0}\nSet PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.")]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine executable could not be spawned at all.
    #[error("OCR engine '{cmd}' could not be started: {detail}\nInstall tesseract or point --ocr-cmd / TESSERACT_CMD at the binary.")]
    OcrEngineUnavailable { cmd: String, detail: String },

    /// The text pass failed for a page. No text is recoverable for the
    /// document, so the whole extraction is escalated.
    #[error("OCR text recognition failed on page {page}: {detail}")]
    OcrTextFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the structured-parsing stage could not produce a model-derived record.
///
/// This is a tagged reason, not a propagated error: the pipeline converts it
/// into [`crate::schema::MarksheetOutput::degraded`] and carries on. The
/// `Display` text becomes the `llm_error:` diagnostic in the degraded record.
#[derive(Debug, Clone, Error)]
pub enum LlmFailure {
    /// The selected provider is missing credentials or an endpoint.
    #[error("provider '{provider}' is not configured: {detail}")]
    NotConfigured { provider: String, detail: String },

    /// The HTTP request to the provider failed before a response arrived.
    #[error("request to provider failed: {0}")]
    Request(String),

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider call exceeded the configured timeout.
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider response carried no usable completion text.
    #[error("provider response contained no completion text")]
    EmptyResponse,

    /// No parseable `{…}` JSON object anywhere in the model output.
    #[error("could not parse JSON from model response")]
    NoJsonObject,

    /// A JSON object was recovered but does not match the output schema.
    #[error("model JSON does not match the marksheet schema: {0}")]
    Schema(String),
}
