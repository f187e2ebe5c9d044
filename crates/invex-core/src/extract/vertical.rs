//! Column-major table extraction.
//!
//! Some invoices come out of OCR one cell per line, column after column:
//! all descriptions, then all quantities, then all amounts. Lines are
//! bucketed by shape and the buckets are zipped back together by position.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::LineItemExtractor;
use super::patterns::{DATE_DMY, LineShape, content_lines};
use crate::models::ExtractedLineItem;

/// Minimum number of characters (exclusive) for a name candidate.
const MIN_NAME_CHARS: usize = 4;

/// Reconstructs items from stacked column values.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalTableExtractor;

/// Lines sorted into column buckets, each in source order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ColumnBuckets<'a> {
    pub names: Vec<&'a str>,
    pub quantities: Vec<Decimal>,
    pub amounts: Vec<Decimal>,
}

impl<'a> ColumnBuckets<'a> {
    /// Sort every non-empty line of `text` into exactly one bucket.
    pub fn classify(text: &'a str) -> Self {
        let mut buckets = Self::default();

        for line in content_lines(text) {
            match LineShape::of(line) {
                LineShape::Integer => {
                    if let Ok(q) = Decimal::from_str(line) {
                        buckets.quantities.push(q);
                    }
                }
                LineShape::Money => {
                    if let Ok(a) = Decimal::from_str(line) {
                        buckets.amounts.push(a);
                    }
                }
                LineShape::Text => {
                    if line.chars().count() > MIN_NAME_CHARS && !DATE_DMY.is_match(line) {
                        buckets.names.push(line);
                    }
                }
            }
        }

        buckets
    }

    /// Number of complete rows the buckets can form.
    pub fn row_count(&self) -> usize {
        self.names
            .len()
            .min(self.quantities.len())
            .min(self.amounts.len())
    }
}

impl VerticalTableExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LineItemExtractor for VerticalTableExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedLineItem> {
        let buckets = ColumnBuckets::classify(text);

        debug!(
            "Column buckets: {} names, {} quantities, {} amounts",
            buckets.names.len(),
            buckets.quantities.len(),
            buckets.amounts.len()
        );

        buckets
            .names
            .iter()
            .zip(&buckets.quantities)
            .zip(&buckets.amounts)
            .map(|((name, quantity), amount)| {
                ExtractedLineItem::new(*name, *quantity, *amount)
            })
            .collect()
    }
}

/// Extract column-major table items from text.
pub fn extract_vertical_items(text: &str) -> Vec<ExtractedLineItem> {
    VerticalTableExtractor::new().extract(text)
}
