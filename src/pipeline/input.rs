//! Input resolution: validate the document path and sniff its format.
//!
//! ## Why sniff magic bytes?
//!
//! Uploads arrive with whatever filename the client chose — scanned
//! marksheets routinely show up as `.pdf` files that are really JPEGs and
//! vice versa. The first bytes of the file are authoritative; the extension
//! is only consulted when the magic is unrecognised (some scanners emit
//! raster formats with nonstandard headers). Rejecting unknown formats here
//! gives callers a meaningful error instead of a rasteriser crash.

use crate::error::ExtractError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What kind of document the extractor is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Multi-page PDF; rasterised page by page via pdfium.
    Pdf,
    /// Single raster image (PNG or JPEG); decoded directly.
    Image,
}

/// Resolve a document path, validating existence, readability, and format.
pub fn resolve_document(path_str: &str) -> Result<(PathBuf, DocumentKind), ExtractError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    let mut magic = [0u8; 4];
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            // Short files read what they can; the remainder stays zeroed.
            let _ = f.read(&mut magic);
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    let kind = sniff_kind(&magic)
        .or_else(|| kind_from_extension(&path))
        .ok_or(ExtractError::UnsupportedFormat {
            path: path.clone(),
            magic,
        })?;

    debug!(path = %path.display(), ?kind, "resolved document");
    Ok((path, kind))
}

/// Identify the format from the file's first bytes.
fn sniff_kind(magic: &[u8; 4]) -> Option<DocumentKind> {
    if magic == b"%PDF" {
        Some(DocumentKind::Pdf)
    } else if magic == b"\x89PNG" || magic.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(DocumentKind::Image)
    } else {
        None
    }
}

/// Extension fallback for files whose magic is unrecognised.
fn kind_from_extension(path: &Path) -> Option<DocumentKind> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => Some(DocumentKind::Pdf),
        Some("png") | Some("jpg") | Some("jpeg") => Some(DocumentKind::Image),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn pdf_magic_wins_over_extension() {
        let f = write_temp(b"%PDF-1.7 rest of file", ".jpg");
        let (_, kind) = resolve_document(f.path().to_str().unwrap()).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn png_magic_detected() {
        let f = write_temp(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A], "");
        let (_, kind) = resolve_document(f.path().to_str().unwrap()).unwrap();
        assert_eq!(kind, DocumentKind::Image);
    }

    #[test]
    fn jpeg_magic_detected() {
        let f = write_temp(&[0xFF, 0xD8, 0xFF, 0xE0], "");
        let (_, kind) = resolve_document(f.path().to_str().unwrap()).unwrap();
        assert_eq!(kind, DocumentKind::Image);
    }

    #[test]
    fn unknown_magic_falls_back_to_extension() {
        let f = write_temp(b"garbage bytes here", ".pdf");
        let (_, kind) = resolve_document(f.path().to_str().unwrap()).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let f = write_temp(b"hello world", ".txt");
        let err = resolve_document(f.path().to_str().unwrap());
        assert!(matches!(err, Err(ExtractError::UnsupportedFormat { .. })));
    }

    #[test]
    fn missing_file_is_rejected() {
        let err = resolve_document("/definitely/not/a/real/marksheet.pdf");
        assert!(matches!(err, Err(ExtractError::FileNotFound { .. })));
    }
}
