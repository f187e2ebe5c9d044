//! Core library for invoice line-item extraction.
//!
//! This crate provides:
//! - Text acquisition (PDF text layer, OCR for images and scanned pages)
//! - Page orientation correction before OCR
//! - Heuristic table extractors (horizontal rows, vertical columns, loose tokens)
//! - A structuring cascade with a generative-model fallback
//! - Normalization of model output into the canonical response shape

pub mod error;
pub mod extract;
pub mod fallback;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod text;

pub use rust_decimal::Decimal;

pub use error::{InvexError, Result};
pub use extract::{LineItemExtractor, Strategy};
pub use fallback::{ApiKey, GeminiClient, GenerativeModel, ModelReply};
pub use models::{
    ExtractedLineItem, ExtractionResponse, ExtractionResult, InvexConfig, PageLineItems,
    TokenUsage,
};
pub use ocr::{OcrBackend, Rotation};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfBackend, PdfExtractor};
pub use pipeline::{Cascade, CascadeOutcome, Pipeline, PipelineOutput, ResponseSource};
pub use text::{DocumentKind, TextAcquirer};
