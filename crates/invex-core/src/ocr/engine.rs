//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use super::{OcrBackend, OrientationClassifier, Result, Rotation, TextRegion, assemble_lines};
use crate::error::OcrError;
use crate::models::OcrConfig;

/// OCR engine backed by `pure-onnx-ocr`, with optional orientation model.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    orientation: Option<OrientationClassifier>,
    keep_unknown_glyphs: bool,
}

impl PureOcrEngine {
    /// Load the detection/recognition models named in the configuration.
    ///
    /// The orientation model is optional: when it is missing or fails to
    /// load, orientation detection reports a failure and pages are read as
    /// they are.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        let orientation = if config.auto_rotate {
            load_orientation(&config.model_path(&config.orientation_model), config.num_threads)
                .map(|classifier| classifier.with_threshold(config.orientation_threshold))
        } else {
            None
        };
        if orientation.is_some() {
            info!(
                "Orientation correction enabled (threshold {:.2})",
                config.orientation_threshold
            );
        }

        Ok(Self {
            engine,
            orientation,
            keep_unknown_glyphs: config.keep_unknown_glyphs,
        })
    }
}

fn load_orientation(path: &Path, num_threads: usize) -> Option<OrientationClassifier> {
    if !path.exists() {
        debug!("No orientation model at {}", path.display());
        return None;
    }

    match OrientationClassifier::from_file(path, num_threads) {
        Ok(classifier) => Some(classifier),
        Err(e) => {
            warn!("Orientation model unavailable: {}", e);
            None
        }
    }
}

impl OcrBackend for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Running OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let regions: Vec<TextRegion> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unknown_glyphs {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                let (x_min, y_min, y_max) = polygon_bounds(&r.bounding_box);
                TextRegion::new(text, x_min, y_min, y_max)
            })
            .collect();

        let region_count = regions.len();
        let text = assemble_lines(regions);

        debug!(
            "OCR complete: {} text regions, {} lines in {}ms",
            region_count,
            text.lines().count(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> Result<Rotation> {
        match &self.orientation {
            Some(classifier) => classifier.detect(image),
            None => Err(OcrError::OrientationDetection(
                "no orientation model loaded".to_string(),
            )),
        }
    }
}

/// Left edge and vertical extent of a detection polygon.
fn polygon_bounds(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32) {
    let mut x_min = f64::INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for coord in polygon.exterior().coords() {
        x_min = x_min.min(coord.x);
        y_min = y_min.min(coord.y);
        y_max = y_max.max(coord.y);
    }

    if !x_min.is_finite() {
        return (0.0, 0.0, 0.0);
    }

    (x_min as f32, y_min as f32, y_max as f32)
}
