//! OCR token extraction: page images → raw text plus word-level tokens.
//!
//! Each page goes through the external OCR engine twice: a plain-text pass
//! that produces the page's recognised text, and a TSV word-data pass that
//! produces per-word confidence and bounding boxes. The two passes fail
//! independently on purpose: text is the load-bearing output (the structured
//! parser consumes it), so a text failure is fatal, while a word-data
//! failure only costs that page its tokens — the confidence fusion stage
//! simply has less signal to blend.
//!
//! Pages fan out across a bounded worker pool; `buffered` (not
//! `buffer_unordered`) keeps completion order equal to page order, which the
//! assembly step relies on for page-major `raw_text` and token ordering.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::schema::Token;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Everything the OCR stage hands downstream.
#[derive(Debug, Clone, Default)]
pub struct OcrOutcome {
    /// Newline-joined page texts, in page order.
    pub raw_text: String,
    /// Word tokens, page-major then engine-native order within a page.
    pub tokens: Vec<Token>,
}

/// Text and tokens recognised from a single page.
struct PageOcr {
    text: String,
    tokens: Vec<Token>,
}

/// Run the OCR engine over every page and assemble the document outcome.
///
/// Page images are written as PNGs under a per-request temp directory that
/// is removed when this function returns, on success and error paths alike.
pub async fn recognize(
    pages: Vec<DynamicImage>,
    config: &ExtractionConfig,
) -> Result<OcrOutcome, ExtractError> {
    let scratch = tempfile::tempdir()
        .map_err(|e| ExtractError::Internal(format!("scratch dir: {e}")))?;

    let page_count = pages.len();
    let results: Vec<Result<PageOcr, ExtractError>> =
        stream::iter(pages.into_iter().enumerate().map(|(idx, image)| {
            let dir = scratch.path().to_path_buf();
            let cmd = config.ocr_cmd.clone();
            let lang = config.ocr_language.clone();
            async move { ocr_page(idx + 1, image, &dir, &cmd, &lang).await }
        }))
        .buffered(config.ocr_concurrency)
        .collect()
        .await;

    let mut texts = Vec::with_capacity(page_count);
    let mut tokens = Vec::new();
    for result in results {
        let page = result?;
        texts.push(page.text);
        tokens.extend(page.tokens);
    }

    debug!(
        pages = page_count,
        tokens = tokens.len(),
        "ocr recognition complete"
    );

    Ok(OcrOutcome {
        raw_text: texts.join("\n"),
        tokens,
    })
}

/// OCR one page: write the PNG, run the text pass, then the word-data pass.
async fn ocr_page(
    page_num: usize,
    image: DynamicImage,
    dir: &Path,
    cmd: &str,
    lang: &str,
) -> Result<PageOcr, ExtractError> {
    let img_path = dir.join(format!("page_{page_num:04}.png"));

    // PNG encoding is CPU-bound; keep it off the async workers.
    let save_path = img_path.clone();
    tokio::task::spawn_blocking(move || {
        image.save_with_format(&save_path, image::ImageFormat::Png)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Page encode task panicked: {e}")))?
    .map_err(|e| ExtractError::Internal(format!("Failed to write page image: {e}")))?;

    let text = run_engine(cmd, &img_path, lang, None)
        .await
        .map_err(|e| match e {
            EngineError::Spawn(detail) => ExtractError::OcrEngineUnavailable {
                cmd: cmd.to_string(),
                detail,
            },
            EngineError::Run(detail) => ExtractError::OcrTextFailed {
                page: page_num,
                detail,
            },
        })?;

    // Word data is best-effort: a failed TSV pass costs this page its tokens,
    // nothing else.
    let tokens = match run_engine(cmd, &img_path, lang, Some("tsv")).await {
        Ok(tsv) => parse_tsv(&tsv, page_num as u32),
        Err(e) => {
            warn!(page = page_num, error = %e, "word-data pass failed; page contributes no tokens");
            Vec::new()
        }
    };

    debug!(page = page_num, chars = text.len(), tokens = tokens.len(), "page recognised");
    Ok(PageOcr { text, tokens })
}

// ── Engine invocation ────────────────────────────────────────────────────

/// Failure modes of one engine invocation, kept separate so callers can tell
/// "engine missing" (configuration problem) from "engine rejected the page".
enum EngineError {
    Spawn(String),
    Run(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Spawn(d) => write!(f, "failed to start engine: {d}"),
            EngineError::Run(d) => write!(f, "engine failed: {d}"),
        }
    }
}

/// Invoke the OCR engine on a page image, capturing stdout.
///
/// `tesseract <image> stdout -l <lang> [tsv]` — the trailing config name
/// switches the engine from plain text to TSV word data.
async fn run_engine(
    cmd: &str,
    image: &Path,
    lang: &str,
    output_format: Option<&str>,
) -> Result<String, EngineError> {
    let mut command = Command::new(cmd);
    command.arg(image).arg("stdout").arg("-l").arg(lang);
    if let Some(format) = output_format {
        command.arg(format);
    }

    let output = command
        .output()
        .await
        .map_err(|e| EngineError::Spawn(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Run(format!(
            "{}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ── TSV parsing ──────────────────────────────────────────────────────────

// tesseract TSV columns:
// level page_num block_num par_num line_num word_num left top width height conf text
const COL_LEFT: usize = 6;
const COL_TOP: usize = 7;
const COL_WIDTH: usize = 8;
const COL_HEIGHT: usize = 9;
const COL_CONF: usize = 10;
const COL_TEXT: usize = 11;

/// Parse the engine's TSV word data into [`Token`]s for one page.
///
/// Only rows with non-empty trimmed text become tokens — structural rows
/// (page/block/paragraph/line) have empty text and are skipped. The native
/// 0–100 confidence is normalised to `[0, 1]`; a missing or unparseable
/// value is treated as −1, which clamps to 0.0. Missing bounding-box
/// coordinates default to 0.
fn parse_tsv(tsv: &str, page: u32) -> Vec<Token> {
    let mut tokens = Vec::new();

    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();

        let text = match fields.get(COL_TEXT).map(|t| t.trim()) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };

        let native_conf: f64 = fields
            .get(COL_CONF)
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(-1.0);
        let conf = (native_conf / 100.0).clamp(0.0, 1.0);

        let coord = |idx: usize| -> i64 {
            fields
                .get(idx)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0)
        };

        tokens.push(Token {
            text: text.to_string(),
            conf,
            bbox: [
                coord(COL_LEFT),
                coord(COL_TOP),
                coord(COL_WIDTH),
                coord(COL_HEIGHT),
            ],
            page,
        });
    }

    tokens
}
