//! Sub-commands and the wiring they share.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;
use std::sync::OnceLock;

use image::DynamicImage;
use tracing::debug;

use invex_core::error::OcrError;
use invex_core::models::OcrConfig;
use invex_core::ocr::{self, OcrBackend, PureOcrEngine, Rotation};
use invex_core::{ApiKey, GeminiClient, InvexConfig, PdfExtractor, Pipeline, TextAcquirer};

/// Pipeline over the production collaborators.
pub type CliPipeline = Pipeline<LazyOcrEngine, PdfExtractor, GeminiClient>;

/// Load configuration from `-c`, else the user config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    if let Some(path) = config_path {
        return Ok(InvexConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(InvexConfig::from_file(&default_path)?)
    } else {
        Ok(InvexConfig::default())
    }
}

/// Build the full pipeline. Must run on a blocking thread.
pub fn build_pipeline(config: &InvexConfig, api_key: ApiKey) -> anyhow::Result<CliPipeline> {
    let model = GeminiClient::new(&config.fallback, api_key)?;
    Ok(Pipeline::from_config(
        LazyOcrEngine::new(config.ocr.clone()),
        PdfExtractor::from_config(&config.pdf),
        model,
        config,
    ))
}

/// Text acquisition only, for `--raw-text`.
pub fn build_acquirer(config: &InvexConfig) -> TextAcquirer<LazyOcrEngine, PdfExtractor> {
    TextAcquirer::new(
        LazyOcrEngine::new(config.ocr.clone()),
        PdfExtractor::from_config(&config.pdf),
        config,
    )
}

/// OCR engine loaded on first use, so text-layer PDFs need no models.
pub struct LazyOcrEngine {
    config: OcrConfig,
    engine: OnceLock<Result<PureOcrEngine, String>>,
}

impl LazyOcrEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            engine: OnceLock::new(),
        }
    }

    fn engine(&self) -> ocr::Result<&PureOcrEngine> {
        self.engine
            .get_or_init(|| PureOcrEngine::from_config(&self.config).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| OcrError::ModelLoad(e.clone()))
    }
}

impl OcrBackend for LazyOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> ocr::Result<String> {
        self.engine()?.recognize(image)
    }

    fn detect_orientation(&self, image: &DynamicImage) -> ocr::Result<Rotation> {
        self.engine()?.detect_orientation(image)
    }
}
