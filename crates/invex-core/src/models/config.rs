//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InvexError;
use crate::fallback::ApiKey;

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Heuristic extraction configuration.
    pub extraction: ExtractionConfig,

    /// Generative-model fallback configuration.
    pub fallback: FallbackConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Document orientation classifier file name.
    pub orientation_model: String,

    /// Keep `[UNK]` markers in recognized text instead of blanking them.
    pub keep_unknown_glyphs: bool,

    /// Detect and correct page rotation before OCR.
    pub auto_rotate: bool,

    /// Minimum classifier confidence for a rotation to be applied.
    pub orientation_threshold: f32,

    /// Number of CPU threads for the orientation classifier.
    pub num_threads: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "en_rec.onnx".to_string(),
            dictionary: "en_dict.txt".to_string(),
            orientation_model: "doc_ori.onnx".to_string(),
            keep_unknown_glyphs: false,
            auto_rotate: true,
            orientation_threshold: 0.5,
            num_threads: 4,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rasterizing scanned pages.
    pub render_dpi: u32,

    /// Maximum pages to rasterize (0 = unlimited).
    pub max_pages: usize,

    /// Directory holding the pdfium shared library. The working directory
    /// and then the system library path are tried when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 0,
            pdfium_library_dir: None,
        }
    }
}

/// Heuristic extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Run the loose token-driven extractor after the table extractors.
    pub enable_loose_heuristics: bool,
}

/// Generative-model fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Model identifier.
    pub model: String,

    /// API base URL.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Inline API key, used when the environment variable is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
            api_key_env: "API_KEY".to_string(),
            api_key: None,
        }
    }
}

impl FallbackConfig {
    /// Resolve the API key from the environment, then the inline value.
    pub fn resolve_api_key(&self) -> Result<ApiKey, InvexError> {
        let from_env = std::env::var(&self.api_key_env).ok();
        self.resolve_api_key_with(from_env)
    }

    fn resolve_api_key_with(&self, from_env: Option<String>) -> Result<ApiKey, InvexError> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .and_then(ApiKey::new)
            .ok_or_else(|| InvexError::MissingCredential(self.api_key_env.clone()))
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, InvexError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), InvexError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| InvexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
