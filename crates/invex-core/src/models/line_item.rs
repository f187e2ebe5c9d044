//! Line-item data models shared by the extractors and the response layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InvexError, Result};

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLineItem {
    /// Item description as printed on the invoice.
    pub item_name: String,

    /// Quantity, kept at the scale it was printed with.
    #[serde(with = "json_number")]
    pub item_quantity: Decimal,

    /// Unit rate, when the layout carries one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "json_number::option"
    )]
    pub item_rate: Option<Decimal>,

    /// Line total.
    #[serde(with = "json_number")]
    pub item_amount: Decimal,
}

impl ExtractedLineItem {
    pub fn new(name: impl Into<String>, quantity: Decimal, amount: Decimal) -> Self {
        Self {
            item_name: name.into(),
            item_quantity: quantity,
            item_rate: None,
            item_amount: amount,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.item_rate = Some(rate);
        self
    }
}

/// Line items found on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLineItems {
    /// Page label (1-indexed, as a string).
    pub page_no: String,
    /// Items in extraction order.
    pub bill_items: Vec<ExtractedLineItem>,
}

/// Structured result of a successful heuristic extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Items grouped by page.
    pub pagewise_line_items: Vec<PageLineItems>,
    /// Number of items across all pages.
    pub total_item_count: usize,
    /// Sum of all item amounts, rounded to two decimal places.
    #[serde(with = "json_number")]
    pub reconciled_amount: Decimal,
}

impl ExtractionResult {
    /// Build a result holding every item on a single page `"1"`.
    ///
    /// The heuristics work on page-concatenated text, so they cannot
    /// attribute items to pages.
    pub fn single_page(items: Vec<ExtractedLineItem>) -> Result<Self> {
        Self::from_pages(vec![PageLineItems {
            page_no: "1".to_string(),
            bill_items: items,
        }])
    }

    /// Build a result from pages, computing the count and reconciled sum.
    ///
    /// Fails with [`InvexError::AmountOverflow`] when the sum leaves the
    /// `Decimal` range.
    pub fn from_pages(pages: Vec<PageLineItems>) -> Result<Self> {
        let total_item_count = pages.iter().map(|p| p.bill_items.len()).sum();
        let reconciled_amount = pages
            .iter()
            .flat_map(|p| p.bill_items.iter())
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.item_amount))
            .ok_or(InvexError::AmountOverflow)?
            .round_dp(2);

        Ok(Self {
            pagewise_line_items: pages,
            total_item_count,
            reconciled_amount,
        })
    }

    /// Iterate over all items in page order.
    pub fn items(&self) -> impl Iterator<Item = &ExtractedLineItem> {
        self.pagewise_line_items
            .iter()
            .flat_map(|p| p.bill_items.iter())
    }
}

/// Token counters reported by the generative model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Decimal (de)serialization as plain JSON numbers.
///
/// Scale-0 values are written as integers so a quantity printed as `10`
/// stays `10`; everything else is written as a float.
pub(crate) mod json_number {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if value.scale() == 0 {
            if let Some(n) = value.to_i64() {
                return serializer.serialize_i64(n);
            }
        }
        match value.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)
    }

    pub mod option {
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Decimal>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Decimal>, D::Error> {
            <Option<Decimal> as Deserialize>::deserialize(deserializer)
        }
    }
}
