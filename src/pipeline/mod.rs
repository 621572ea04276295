//! Pipeline stages for marksheet extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the OCR engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ parse ──▶ fuse
//! (path)   (pdfium)  (tesseract) (LLM)  (confidence blend)
//! ```
//!
//! 1. [`input`]  — validate the document path and sniff PDF vs raster image
//! 2. [`render`] — rasterise pages; runs in `spawn_blocking` because pdfium
//!    is not async-safe
//! 3. [`ocr`]    — run the OCR engine per page (text pass + TSV word-data
//!    pass) under a bounded, order-preserving worker pool
//! 4. [`parse`]  — drive the LLM provider call and JSON recovery; the only
//!    stage with network I/O, and the only one that never errors upward
//! 5. [`fuse`]   — blend model and OCR confidence into each field's final
//!    score
//!
//! Stages 1–3 form the Token Extractor; their failures are fatal except the
//! per-page word-data degradation described in [`ocr`]. Stage 4 degrades to
//! the zero-confidence record instead of failing. Stage 5 is pure
//! computation and cannot fail.

pub mod fuse;
pub mod input;
pub mod ocr;
pub mod parse;
pub mod render;
