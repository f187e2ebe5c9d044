//! Text acquisition: document file → raw text.
//!
//! Text-bearing PDFs are read from their text layer. Images and scanned PDF
//! pages go through orientation correction and OCR.

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{InvexError, PdfError, Result};
use crate::models::InvexConfig;
use crate::ocr::{OcrBackend, normalize_orientation};
use crate::pdf::PdfBackend;

/// Image extensions accepted for OCR.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Document type, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "pdf" {
            Ok(Self::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Image)
        } else {
            Err(InvexError::UnsupportedFileType(if ext.is_empty() {
                "(none)".to_string()
            } else {
                ext
            }))
        }
    }
}

/// Produces raw document text through the OCR and PDF collaborators.
pub struct TextAcquirer<O, P> {
    ocr: O,
    pdf: P,
    auto_rotate: bool,
    render_dpi: u32,
    max_pages: usize,
}

impl<O: OcrBackend, P: PdfBackend> TextAcquirer<O, P> {
    pub fn new(ocr: O, pdf: P, config: &InvexConfig) -> Self {
        Self {
            ocr,
            pdf,
            auto_rotate: config.ocr.auto_rotate,
            render_dpi: config.pdf.render_dpi,
            max_pages: config.pdf.max_pages,
        }
    }

    /// Read a document from disk and return its text.
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        let kind = DocumentKind::from_path(path)?;
        info!("Acquiring text from {} ({:?})", path.display(), kind);

        let data = std::fs::read(path)?;
        match kind {
            DocumentKind::Image => self.image_text(&data),
            DocumentKind::Pdf => self.pdf_text(&data),
        }
    }

    /// OCR an encoded image.
    pub fn image_text(&self, data: &[u8]) -> Result<String> {
        let image = image::load_from_memory(data)
            .map_err(|e| InvexError::UnreadableImage(e.to_string()))?;
        self.ocr_image(image)
    }

    /// Text of a PDF: the text layer when present, OCR of the pages otherwise.
    pub fn pdf_text(&self, data: &[u8]) -> Result<String> {
        let pages = match self.pdf.page_texts(data) {
            Ok(pages) => pages,
            Err(PdfError::TextExtraction(e)) => {
                warn!("Text layer unreadable, treating as scanned: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        // Whitespace-only pages still contribute a line break; only the
        // joined text is trimmed.
        let joined = self
            .limit(pages)
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let text = joined.trim();

        if !text.is_empty() {
            debug!("Using PDF text layer ({} chars)", text.len());
            return Ok(text.to_string());
        }

        info!("No text layer, rasterizing pages at {} DPI", self.render_dpi);
        let images = self.pdf.render_pages(data, self.render_dpi)?;

        let mut outputs = Vec::new();
        for (index, image) in self.limit(images).into_iter().enumerate() {
            debug!("OCR on page {}", index + 1);
            outputs.push(self.ocr_image(image)?);
        }

        Ok(outputs.join("\n"))
    }

    /// Orientation-correct and OCR a decoded image.
    pub fn ocr_image(&self, image: DynamicImage) -> Result<String> {
        let image = if self.auto_rotate {
            normalize_orientation(image, &self.ocr)
        } else {
            image
        };
        Ok(self.ocr.recognize(&image)?)
    }

    fn limit<T>(&self, mut pages: Vec<T>) -> Vec<T> {
        if self.max_pages > 0 && pages.len() > self.max_pages {
            debug!("Limiting to the first {} of {} pages", self.max_pages, pages.len());
            pages.truncate(self.max_pages);
        }
        pages
    }
}
