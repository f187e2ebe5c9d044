//! Canonical response shape returned to the request-handling layer.

use serde::Serialize;
use serde_json::Value;

use super::line_item::ExtractionResult;

/// Final response for one document.
///
/// Serializes to `{is_success, data?, raw_text?}`. The model variant is the
/// normalized model object passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResponse {
    /// Items found by a heuristic extractor.
    Items {
        is_success: bool,
        data: ExtractionResult,
    },
    /// Object produced by the generative model.
    Model(Value),
    /// Degraded response carrying only the acquired text.
    RawText { is_success: bool, raw_text: String },
}

impl ExtractionResponse {
    pub fn items(data: ExtractionResult) -> Self {
        Self::Items {
            is_success: true,
            data,
        }
    }

    pub fn raw_text(raw_text: impl Into<String>) -> Self {
        Self::RawText {
            is_success: true,
            raw_text: raw_text.into(),
        }
    }

    /// Heuristic result, if this response came from one.
    pub fn extraction(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Items { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_raw_text_shape() {
        let response = ExtractionResponse::raw_text("hello");
        assert_eq!(
            response.to_value(),
            json!({"is_success": true, "raw_text": "hello"})
        );
    }

    #[test]
    fn test_items_shape() {
        let response = ExtractionResponse::items(ExtractionResult::single_page(Vec::new()).unwrap());
        assert_eq!(
            response.to_value(),
            json!({
                "is_success": true,
                "data": {
                    "pagewise_line_items": [{"page_no": "1", "bill_items": []}],
                    "total_item_count": 0,
                    "reconciled_amount": 0
                }
            })
        );
    }

    #[test]
    fn test_model_object_passes_through() {
        let object = json!({"is_success": true, "data": {"anything": [1, 2]}});
        let response = ExtractionResponse::Model(object.clone());
        assert_eq!(response.to_value(), object);
    }
}
