//! Page orientation correction before OCR.

use image::DynamicImage;
use tracing::debug;

use super::OcrBackend;

/// Clockwise rotation that brings a page upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Snap an angle in degrees to the nearest quadrant.
    pub fn from_degrees(degrees: f32) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        match ((normalized / 90.0).round() as u32) % 4 {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Rotate the image clockwise by this angle about its centre.
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::Deg0 => image,
            Self::Deg90 => image.rotate90(),
            Self::Deg180 => image.rotate180(),
            Self::Deg270 => image.rotate270(),
        }
    }
}

/// Rotate `image` upright using the backend's orientation detector.
///
/// A failed detection leaves the image as it is.
pub fn normalize_orientation<O: OcrBackend + ?Sized>(image: DynamicImage, ocr: &O) -> DynamicImage {
    let rotation = match ocr.detect_orientation(&image) {
        Ok(rotation) => rotation,
        Err(e) => {
            debug!("Orientation unknown, assuming upright: {}", e);
            Rotation::Deg0
        }
    };

    if rotation != Rotation::Deg0 {
        debug!("Rotating page by {} degrees", rotation.degrees());
    }

    rotation.apply(image)
}
