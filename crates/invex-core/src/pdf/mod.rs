//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfBackend {
    /// Text layer of each page, in page order (empty for image-only pages).
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>>;

    /// One raster per page at the requested resolution, in page order.
    fn render_pages(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>>;
}

impl<P: PdfBackend + ?Sized> PdfBackend for &P {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>> {
        (**self).page_texts(data)
    }

    fn render_pages(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        (**self).render_pages(data, dpi)
    }
}
