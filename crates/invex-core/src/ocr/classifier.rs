//! Document orientation classification with an ONNX model.

use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use tracing::debug;

use super::Rotation;
use crate::error::OcrError;

const RESIZE_SHORT: u32 = 256;
const CROP_SIZE: u32 = 224;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Four-class (0/90/180/270) page orientation classifier.
///
/// Class `k` means the page content is turned `k * 90` degrees
/// counter-clockwise, so the correction is a clockwise turn of the same
/// angle.
pub struct OrientationClassifier {
    session: Mutex<Session>,
    input_name: String,
    threshold: f32,
}

impl OrientationClassifier {
    /// Load the classifier model.
    pub fn from_file(path: &Path, num_threads: usize) -> Result<Self, OcrError> {
        debug!("Loading orientation model from: {}", path.display());

        let bytes = std::fs::read(path)
            .map_err(|e| OcrError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        let session = Session::builder()
            .map_err(|e| OcrError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| OcrError::ModelLoad(e.to_string()))?
            .with_intra_threads(num_threads.max(1))
            .map_err(|e| OcrError::ModelLoad(e.to_string()))?
            .commit_from_memory(&bytes)
            .map_err(|e| OcrError::ModelLoad(e.to_string()))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "x".to_string());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            threshold: 0.5,
        })
    }

    /// Minimum class probability for a rotation to be reported.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Classify the page, returning the correction and its confidence.
    pub fn classify(&self, image: &DynamicImage) -> Result<(Rotation, f32), OcrError> {
        let tensor = preprocess(image)?;
        let shape: Vec<i64> = tensor.shape().iter().map(|&s| s as i64).collect();
        let data: Vec<f32> = tensor.iter().copied().collect();

        let input: SessionInputValue<'static> = Tensor::from_array((shape, data))
            .map(Into::into)
            .map_err(|e| OcrError::OrientationDetection(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| OcrError::OrientationDetection(format!("session lock: {}", e)))?;

        let outputs = session
            .run(vec![(self.input_name.as_str(), input)])
            .map_err(|e| OcrError::OrientationDetection(e.to_string()))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| OcrError::OrientationDetection("no output from classifier".to_string()))?;

        let (_, probs) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| OcrError::OrientationDetection(e.to_string()))?;

        if probs.len() < 4 {
            return Err(OcrError::OrientationDetection(format!(
                "expected 4 class scores, got {}",
                probs.len()
            )));
        }

        let (class, confidence) = probs[..4]
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));

        let rotation = Rotation::from_degrees(360.0 - class as f32 * 90.0);
        debug!(
            "Orientation class {} -> rotate {}° (confidence: {:.3})",
            class,
            rotation.degrees(),
            confidence
        );

        Ok((rotation, confidence))
    }

    /// Correction to apply, or `Deg0` below the confidence threshold.
    pub fn detect(&self, image: &DynamicImage) -> Result<Rotation, OcrError> {
        let (rotation, confidence) = self.classify(image)?;
        Ok(gate(rotation, confidence, self.threshold))
    }
}

fn gate(rotation: Rotation, confidence: f32, threshold: f32) -> Rotation {
    if confidence < threshold {
        debug!(
            "Orientation confidence {:.3} below {:.3}, keeping page upright",
            confidence, threshold
        );
        return Rotation::Deg0;
    }
    rotation
}

/// Resize the short side to 256, centre-crop 224x224, ImageNet-normalize.
fn preprocess(image: &DynamicImage) -> Result<Array4<f32>, OcrError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OcrError::InvalidImage("empty image".to_string()));
    }

    let scale = RESIZE_SHORT as f32 / width.min(height) as f32;
    let new_width = ((width as f32 * scale).round() as u32).max(CROP_SIZE);
    let new_height = ((height as f32 * scale).round() as u32).max(CROP_SIZE);

    let resized = image.resize_exact(new_width, new_height, FilterType::Triangle);
    let left = (new_width - CROP_SIZE) / 2;
    let top = (new_height - CROP_SIZE) / 2;
    let rgb = resized.crop_imm(left, top, CROP_SIZE, CROP_SIZE).to_rgb8();

    let size = CROP_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - MEAN[c]) / STD[c];
        }
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_preprocess_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 400, Rgb([255, 255, 255])));
        let tensor = preprocess(&img).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        let expected = (1.0 - MEAN[0]) / STD[0];
        assert!((tensor[[0, 0, 10, 10]] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_gate_keeps_page_below_threshold() {
        assert_eq!(gate(Rotation::Deg90, 0.4, 0.5), Rotation::Deg0);
        assert_eq!(gate(Rotation::Deg90, 0.5, 0.5), Rotation::Deg90);
        assert_eq!(gate(Rotation::Deg180, 0.7, 0.8), Rotation::Deg0);
        assert_eq!(gate(Rotation::Deg180, 0.9, 0.8), Rotation::Deg180);
    }

    #[test]
    fn test_preprocess_rejects_empty() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(preprocess(&img).is_err());
    }
}
