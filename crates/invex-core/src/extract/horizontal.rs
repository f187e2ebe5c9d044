//! Row-major table extraction: one item per line.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::LineItemExtractor;
use super::patterns::HORIZONTAL_ROW;
use crate::models::ExtractedLineItem;

/// Extracts items from lines shaped like
/// `<no> <description> <DD/MM/YYYY> <qty> <rate> <amount>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalTableExtractor;

impl HorizontalTableExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(&self, line: &str) -> Option<ExtractedLineItem> {
        let caps = HORIZONTAL_ROW.captures(line)?;

        let name = caps[1].trim();
        let quantity = Decimal::from_str(&caps[2]).ok()?;
        let rate = Decimal::from_str(&caps[3]).ok();
        let amount = Decimal::from_str(&caps[4]).ok();

        let (Some(rate), Some(amount)) = (rate, amount) else {
            trace!("Row matched but numbers did not parse: {}", line);
            return None;
        };

        Some(ExtractedLineItem::new(name, quantity, amount).with_rate(rate))
    }
}

impl LineItemExtractor for HorizontalTableExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedLineItem> {
        text.lines()
            .filter_map(|line| self.parse_line(line.trim()))
            .collect()
    }
}

/// Extract row-major table items from text.
pub fn extract_horizontal_items(text: &str) -> Vec<ExtractedLineItem> {
    HorizontalTableExtractor::new().extract(text)
}
