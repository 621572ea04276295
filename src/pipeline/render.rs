//! Document rasterisation: PDF pages (or a single image) to `DynamicImage`.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations, preventing the
//! Tokio worker threads from stalling during CPU-heavy rendering. Image
//! decoding takes the same route for the same reason.
//!
//! ## Why cap pixels, not DPI?
//!
//! Scan sizes vary wildly; `target_pixels` caps the longest edge regardless
//! of physical page size, keeping memory bounded while staying above the
//! OCR engine's recognition floor for ordinary print.

use crate::error::ExtractError;
use crate::pipeline::input::DocumentKind;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Rasterise a document into page images, in page order.
///
/// PDF pages render via pdfium; a raster image input decodes to a single
/// "page". Any failure here is fatal — with no pixels there is nothing for
/// the rest of the pipeline to work on.
pub async fn rasterize(
    path: &Path,
    kind: DocumentKind,
    target_pixels: u32,
) -> Result<Vec<DynamicImage>, ExtractError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => render_pdf_blocking(&path, target_pixels),
        DocumentKind::Image => decode_image_blocking(&path),
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Rasterise task panicked: {e}")))?
}

/// Blocking implementation of PDF page rendering.
fn render_pdf_blocking(
    pdf_path: &Path,
    target_pixels: u32,
) -> Result<Vec<DynamicImage>, ExtractError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ExtractError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_pixels as i32)
        .set_maximum_height(target_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| ExtractError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{e:?}"),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(image);
    }

    Ok(results)
}

/// Blocking implementation of raster-image decoding.
fn decode_image_blocking(path: &Path) -> Result<Vec<DynamicImage>, ExtractError> {
    let image = image::open(path).map_err(|e| ExtractError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!(
        "Decoded image {} → {}x{} px",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(vec![image])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn image_input_yields_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            32,
            24,
            Rgba([255, 255, 255, 255]),
        ));
        img.save(&path).unwrap();

        let pages = rasterize(&path, DocumentKind::Image, 2000).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), 32);
    }

    #[tokio::test]
    async fn undecodable_image_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = rasterize(&path, DocumentKind::Image, 2000).await;
        assert!(matches!(err, Err(ExtractError::ImageDecodeFailed { .. })));
    }
}
