//! Heuristic line-item extractors.
//!
//! Every extractor maps raw document text to a (possibly empty) list of
//! items. An empty list means "this layout was not recognized" and is the
//! signal to try the next strategy, never an error.

mod horizontal;
mod loose;
pub mod patterns;
mod vertical;

pub use horizontal::{HorizontalTableExtractor, extract_horizontal_items};
pub use loose::{LooseItemExtractor, extract_loose_items};
pub use vertical::{ColumnBuckets, VerticalTableExtractor, extract_vertical_items};

use serde::{Deserialize, Serialize};

use crate::models::ExtractedLineItem;

/// Trait for line-item extractors.
pub trait LineItemExtractor {
    /// Extract items from text, in source order.
    fn extract(&self, text: &str) -> Vec<ExtractedLineItem>;
}

/// Heuristic strategies, in the order the cascade may try them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One item per line (see [`HorizontalTableExtractor`]).
    Horizontal,
    /// Stacked columns (see [`VerticalTableExtractor`]).
    Vertical,
    /// Token-driven grouping (see [`LooseItemExtractor`]).
    Loose,
}

impl Strategy {
    /// Default cascade order. The loose extractor is opt-in.
    pub const DEFAULT_ORDER: [Strategy; 2] = [Strategy::Horizontal, Strategy::Vertical];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Loose => "loose",
        }
    }

    /// The built-in extractor for this strategy.
    pub fn extractor(&self) -> Box<dyn LineItemExtractor + Send + Sync> {
        match self {
            Self::Horizontal => Box::new(HorizontalTableExtractor::new()),
            Self::Vertical => Box::new(VerticalTableExtractor::new()),
            Self::Loose => Box::new(LooseItemExtractor::new()),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
