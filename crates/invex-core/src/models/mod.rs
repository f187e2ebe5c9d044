//! Data models for line-item extraction.

pub mod config;
pub mod line_item;
pub mod response;

pub use config::{ExtractionConfig, FallbackConfig, InvexConfig, OcrConfig, PdfConfig};
pub use line_item::{ExtractedLineItem, ExtractionResult, PageLineItems, TokenUsage};
pub use response::ExtractionResponse;
