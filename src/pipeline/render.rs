//! PDF rendering: lay the normalised document out with printpdf.
//!
//! ## Why spawn_blocking?
//!
//! HTML layout and font subsetting are CPU-bound and take tens to hundreds
//! of milliseconds for a long document. `tokio::task::spawn_blocking` moves
//! the work onto the blocking pool so the async workers stay responsive
//! when several conversions run side by side.
//!
//! The engine is a black box here: it gets the finished document and a page
//! size and returns bytes or an error. Whatever markup repairs it performs
//! on top of html5ever's are its own business.

use crate::config::PageProfile;
use crate::error::Html2PdfError;
use printpdf::{GeneratePdfOptions, PdfDocument, PdfSaveOptions};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// PDF bytes straight from the engine, before finalisation.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub warnings: usize,
}

/// Render a complete HTML document to PDF bytes.
pub async fn render_pdf(
    html: String,
    page: PageProfile,
    font_embedding: bool,
) -> Result<RenderedPdf, Html2PdfError> {
    tokio::task::spawn_blocking(move || render_blocking(&html, &page, font_embedding))
        .await
        .map_err(|e| Html2PdfError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of rendering.
pub fn render_blocking(
    html: &str,
    page: &PageProfile,
    font_embedding: bool,
) -> Result<RenderedPdf, Html2PdfError> {
    let options = GeneratePdfOptions {
        page_width: Some(page.width_mm),
        page_height: Some(page.height_mm),
        font_embedding: Some(font_embedding),
        ..Default::default()
    };

    let mut warnings = Vec::new();
    let document = PdfDocument::from_html(
        html,
        &BTreeMap::new(),
        &BTreeMap::new(),
        &options,
        &mut warnings,
    )
    .map_err(|e| Html2PdfError::RenderingFailed {
        detail: e.to_string(),
    })?;

    let pages = document.pages.len();
    if pages == 0 {
        return Err(Html2PdfError::RenderingFailed {
            detail: "the engine produced a document without pages".into(),
        });
    }

    let bytes = document.save(&PdfSaveOptions::default(), &mut warnings);
    if bytes.is_empty() {
        return Err(Html2PdfError::RenderingFailed {
            detail: "the engine produced no output".into(),
        });
    }

    for w in &warnings {
        warn!("Renderer warning: {:?}", w);
    }
    debug!(
        "Rendered {} pages → {} bytes ({} warnings)",
        pages,
        bytes.len(),
        warnings.len()
    );

    Ok(RenderedPdf {
        bytes,
        pages,
        warnings: warnings.len(),
    })
}
