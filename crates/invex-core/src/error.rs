//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// The file extension is outside the recognized image/PDF set.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Image bytes could not be decoded.
    #[error("failed to read image: {0}")]
    UnreadableImage(String),

    /// No fallback-model API key is configured.
    #[error("API key not found (set the {0} environment variable)")]
    MissingCredential(String),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Generative-model fallback error.
    #[error("fallback error: {0}")]
    Fallback(#[from] FallbackError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Item amounts sum past the representable decimal range.
    #[error("line-item amounts overflow the reconciled total")]
    AmountOverflow,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The pdfium library could not be bound.
    #[error("PDF renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// Failed to rasterize a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Orientation could not be determined. Never fatal to acquisition.
    #[error("orientation detection failed: {0}")]
    OrientationDetection(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to the generative-model fallback.
#[derive(Error, Debug)]
pub enum FallbackError {
    /// Model output could not be turned into a JSON object.
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),

    /// The request could not be sent or the body could not be read.
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model endpoint answered with a non-success status.
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint's response envelope did not have the expected shape.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
