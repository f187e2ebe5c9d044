//! PDF text layer via lopdf and pdf-extract, page rasters via pdfium.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use lopdf::Document;
use pdfium_render::prelude::*;
use tracing::{debug, trace};

use super::{PdfBackend, Result};
use crate::error::PdfError;
use crate::models::PdfConfig;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// PDF collaborator backed by lopdf and pdf-extract for text, and pdfium
/// for rasterizing pages.
///
/// Every page is rendered, whatever its content: scans, vector drawings,
/// and text that has no usable text layer.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    library_dir: Option<PathBuf>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self {
            library_dir: config.pdfium_library_dir.clone(),
        }
    }

    /// Look for the pdfium shared library in `dir` before the system path.
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    /// Parse the document, decrypting empty-password PDFs.
    ///
    /// Returns the document and the bytes the text and render backends
    /// should read.
    fn load<'a>(&self, data: &'a [u8]) -> Result<(Document, Cow<'a, [u8]>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let bytes = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            Cow::Owned(decrypted)
        } else {
            Cow::Borrowed(data)
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok((doc, bytes))
    }

    fn bind(&self) -> Result<Pdfium> {
        let dir = self.library_dir.as_deref().unwrap_or(Path::new("./"));
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::RendererUnavailable(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }
}

/// Pixel size of a page of `width_pt` x `height_pt` points at `dpi`.
fn target_size(width_pt: f32, height_pt: f32, dpi: u32) -> (i32, i32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let width = (width_pt * scale).round().max(1.0) as i32;
    let height = (height_pt * scale).round().max(1.0) as i32;
    (width, height)
}

fn render_page(page: &PdfPage, dpi: u32) -> std::result::Result<DynamicImage, PdfiumError> {
    let (width, height) = target_size(page.width().value, page.height().value, dpi);
    trace!("Rendering page at {}x{}", width, height);

    let bitmap = page.render_with_config(
        &PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height)
            .render_form_data(true)
            .render_annotations(true),
    )?;

    Ok(bitmap.as_image())
}

impl PdfBackend for PdfExtractor {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>> {
        let (doc, bytes) = self.load(data)?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        debug!(
            "Extracted text layer from {} of {} pages",
            pages.iter().filter(|p| !p.trim().is_empty()).count(),
            doc.get_pages().len()
        );

        Ok(pages)
    }

    fn render_pages(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let (_, bytes) = self.load(data)?;
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| PdfError::Parse(e.to_string()))?;

        let pages = document.pages();
        let mut images = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            let image = render_page(&page, dpi)
                .map_err(|e| PdfError::Render(format!("page {}: {}", index + 1, e)))?;
            images.push(image);
        }

        debug!("Rasterized {} pages at {} DPI", images.len(), dpi);
        Ok(images)
    }
}
