//! Token-driven grouping for irregular layouts.
//!
//! A line mentioning a medicine form or unit (`tab`, `cap`, `syp`, `inj`,
//! `mg`, `ml`) opens a new item; the numeric lines that follow fill it in.
//! This is more permissive than the table extractors and is not part of the
//! default cascade.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::LineItemExtractor;
use super::patterns::{ITEM_TOKEN, LineShape, content_lines};
use crate::models::ExtractedLineItem;

/// Groups lines into items using lexical cues.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseItemExtractor;

/// An item being assembled from consecutive lines.
#[derive(Debug, Default)]
struct PartialItem {
    name: Option<String>,
    quantity: Option<Decimal>,
    rate: Option<Decimal>,
    amount: Option<Decimal>,
}

impl PartialItem {
    fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn push_money(&mut self, value: Decimal) {
        if self.rate.is_none() {
            self.rate = Some(value);
        } else {
            self.amount = Some(value);
        }
    }

    /// Complete item, if name, quantity and amount were all seen.
    fn finish(self) -> Option<ExtractedLineItem> {
        let item = ExtractedLineItem {
            item_name: self.name?,
            item_quantity: self.quantity?,
            item_rate: self.rate,
            item_amount: self.amount?,
        };
        Some(item)
    }
}

impl LooseItemExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LineItemExtractor for LooseItemExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedLineItem> {
        let mut records = Vec::new();
        let mut current = PartialItem::default();

        for line in content_lines(text) {
            if ITEM_TOKEN.is_match(line) {
                let previous = std::mem::replace(&mut current, PartialItem::named(line));
                if previous.name.is_some() {
                    records.push(previous);
                }
                continue;
            }

            match LineShape::of(line) {
                LineShape::Integer => {
                    if current.quantity.is_none() {
                        current.quantity = Decimal::from_str(line).ok();
                    }
                }
                LineShape::Money => {
                    if let Ok(value) = Decimal::from_str(line) {
                        current.push_money(value);
                    }
                }
                LineShape::Text => trace!("Ignoring line: {}", line),
            }
        }

        if current.name.is_some() {
            records.push(current);
        }

        records.into_iter().filter_map(PartialItem::finish).collect()
    }
}

/// Extract items from irregular layouts using medicine/unit tokens.
pub fn extract_loose_items(text: &str) -> Vec<ExtractedLineItem> {
    LooseItemExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_groups_following_lines() {
        let text = "\
            Dolo 650 Tab\n\
            2\n\
            15.00\n\
            30.00\n\
            Benadryl Syp 100ml\n\
            1\n\
            95.00\n\
            95.00\n";

        let items = extract_loose_items(text);

        assert_eq!(
            items,
            vec![
                ExtractedLineItem::new("Dolo 650 Tab", dec("2"), dec("30.00")).with_rate(dec("15.00")),
                ExtractedLineItem::new("Benadryl Syp 100ml", dec("1"), dec("95.00"))
                    .with_rate(dec("95.00")),
            ]
        );
    }

    #[test]
    fn test_first_quantity_wins() {
        let items = extract_loose_items("Azithral 500mg\n3\n7\n20.00\n60.00");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_quantity, dec("3"));
    }

    #[test]
    fn test_later_money_lines_replace_amount() {
        let items = extract_loose_items("Pan 40 Tab\n1\n10.00\n20.00\n30.00");

        assert_eq!(items[0].item_rate, Some(dec("10.00")));
        assert_eq!(items[0].item_amount, dec("30.00"));
    }

    #[test]
    fn test_incomplete_records_are_dropped() {
        let text = "\
            5\n\
            Crocin Tab\n\
            2\n\
            12.00\n\
            Insulin Inj\n\
            1\n\
            450.00\n\
            450.00\n";

        let items = extract_loose_items(text);

        // Crocin only has a rate, so only the insulin survives.
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Insulin Inj");
    }

    #[test]
    fn test_numbers_before_first_name_are_discarded() {
        let items = extract_loose_items("4\n10.00\n40.00\nOmez Cap\n2\n5.00\n10.00");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_quantity, dec("2"));
        assert_eq!(items[0].item_amount, dec("10.00"));
    }

    #[test]
    fn test_no_tokens_is_empty() {
        assert!(extract_loose_items("Consultation\n1\n500.00\n500.00").is_empty());
    }
}
