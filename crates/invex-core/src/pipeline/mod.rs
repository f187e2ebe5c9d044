//! Document → response orchestration.
//!
//! Text is acquired once, the heuristic cascade is tried, and only when no
//! strategy matches is the generative model consulted. Malformed model output
//! degrades to a raw-text response instead of failing the document.

mod cascade;

pub use cascade::{Cascade, CascadeOutcome};

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::Strategy;
use crate::fallback::{GenerativeModel, build_prompt, normalize_reply};
use crate::models::{ExtractionResponse, ExtractionResult, InvexConfig};
use crate::ocr::OcrBackend;
use crate::pdf::PdfBackend;
use crate::text::TextAcquirer;

/// Which stage produced the final response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Horizontal,
    Vertical,
    Loose,
    Model,
    RawText,
}

impl From<Strategy> for ResponseSource {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Horizontal => Self::Horizontal,
            Strategy::Vertical => Self::Vertical,
            Strategy::Loose => Self::Loose,
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Loose => "loose",
            Self::Model => "model",
            Self::RawText => "raw_text",
        })
    }
}

/// Result of processing one document.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub response: ExtractionResponse,
    pub source: ResponseSource,
    pub raw_text: String,
    pub processing_time_ms: u64,
}

/// The full extraction pipeline over its three collaborators.
pub struct Pipeline<O, P, M> {
    acquirer: TextAcquirer<O, P>,
    cascade: Cascade,
    model: M,
}

impl<O: OcrBackend, P: PdfBackend, M: GenerativeModel> Pipeline<O, P, M> {
    pub fn new(acquirer: TextAcquirer<O, P>, cascade: Cascade, model: M) -> Self {
        Self {
            acquirer,
            cascade,
            model,
        }
    }

    /// Build a pipeline with the cascade and acquisition settings from `config`.
    pub fn from_config(ocr: O, pdf: P, model: M, config: &InvexConfig) -> Self {
        Self::new(
            TextAcquirer::new(ocr, pdf, config),
            Cascade::from_config(&config.extraction),
            model,
        )
    }

    /// Acquire the raw text of a document.
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        self.acquirer.extract_text(path)
    }

    /// Run the heuristic cascade. `Ok(None)` when no strategy matched.
    pub fn extract_structured(&self, text: &str) -> Result<Option<ExtractionResult>> {
        Ok(self.match_heuristics(text)?.map(|(_, result)| result))
    }

    /// Ask the model for a structured object.
    ///
    /// Returns `Ok(None)` when the model output cannot be normalized.
    /// Transport and API errors propagate.
    pub fn run_fallback(&self, text: &str) -> Result<Option<Value>> {
        info!("Falling back to generative model");
        let reply = self.model.generate(&build_prompt(text))?;
        debug!("Model replied with {} chars", reply.text.len());
        Ok(normalize_reply(&reply))
    }

    /// Build the response for already-acquired text.
    pub fn structure(&self, text: &str) -> Result<(ExtractionResponse, ResponseSource)> {
        if let Some((strategy, result)) = self.match_heuristics(text)? {
            info!(
                "Extracted {} items via {} heuristics",
                result.total_item_count, strategy
            );
            return Ok((ExtractionResponse::items(result), strategy.into()));
        }

        match self.run_fallback(text)? {
            Some(value) => Ok((ExtractionResponse::Model(value), ResponseSource::Model)),
            None => {
                warn!("Model output unusable, returning raw text");
                Ok((ExtractionResponse::raw_text(text), ResponseSource::RawText))
            }
        }
    }

    /// Process one document end to end.
    pub fn process(&self, path: &Path) -> Result<PipelineOutput> {
        let start = Instant::now();

        let raw_text = self.extract_text(path)?;
        debug!("Acquired {} lines of text", raw_text.lines().count());

        let (response, source) = self.structure(&raw_text)?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Processed {} via {} in {}ms",
            path.display(),
            source,
            processing_time_ms
        );

        Ok(PipelineOutput {
            response,
            source,
            raw_text,
            processing_time_ms,
        })
    }

    fn match_heuristics(&self, text: &str) -> Result<Option<(Strategy, ExtractionResult)>> {
        match self.cascade.run(text) {
            CascadeOutcome::Matched { strategy, items } => {
                Ok(Some((strategy, ExtractionResult::single_page(items)?)))
            }
            CascadeOutcome::NoMatch => Ok(None),
        }
    }
}
