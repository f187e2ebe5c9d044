//! OCR collaborator: image → text, image → orientation.

#[cfg(feature = "native")]
mod classifier;
#[cfg(feature = "native")]
mod engine;
mod layout;
mod orientation;

#[cfg(feature = "native")]
pub use classifier::OrientationClassifier;
#[cfg(feature = "native")]
pub use engine::PureOcrEngine;
pub use layout::{TextRegion, assemble_lines};
pub use orientation::{Rotation, normalize_orientation};

use image::DynamicImage;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Trait for OCR engines.
pub trait OcrBackend {
    /// Recognize the text in an image, one visual line per output line.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;

    /// Detect the clockwise rotation needed to make the text upright.
    fn detect_orientation(&self, image: &DynamicImage) -> Result<Rotation>;
}

impl<O: OcrBackend + ?Sized> OcrBackend for &O {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> Result<Rotation> {
        (**self).detect_orientation(image)
    }
}
