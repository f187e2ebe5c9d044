//! Turns raw model text into the canonical JSON object.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{ModelReply, Result};
use crate::error::FallbackError;
use crate::models::TokenUsage;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)```json|```").unwrap();
}

/// Remove Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Parse model text into a JSON object.
///
/// An array reply keeps only its first element. When `usage` is given it is
/// attached as `data.token_usage`, leaving the rest of `data` untouched.
pub fn normalize_model_output(raw: &str, usage: Option<&TokenUsage>) -> Result<Value> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(FallbackError::MalformedModelOutput(
            "empty model output".to_string(),
        ));
    }

    let parsed: Value = serde_json::from_str(&cleaned)
        .map_err(|e| FallbackError::MalformedModelOutput(e.to_string()))?;

    let parsed = match parsed {
        Value::Array(items) => {
            debug!("Model returned an array of {} values, keeping the first", items.len());
            items.into_iter().next().ok_or_else(|| {
                FallbackError::MalformedModelOutput("empty JSON array".to_string())
            })?
        }
        other => other,
    };

    let Value::Object(mut object) = parsed else {
        return Err(FallbackError::MalformedModelOutput(
            "top-level value is not an object".to_string(),
        ));
    };

    if let Some(usage) = usage {
        attach_token_usage(&mut object, usage);
    }

    Ok(Value::Object(object))
}

/// Normalize a model reply, logging and discarding malformed output.
pub fn normalize_reply(reply: &ModelReply) -> Option<Value> {
    match normalize_model_output(&reply.text, reply.usage.as_ref()) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding model output: {}", e);
            None
        }
    }
}

/// Set `data.token_usage` to the call's counters. Other `data` keys are
/// kept; a `token_usage` the model wrote itself is replaced.
fn attach_token_usage(object: &mut Map<String, Value>, usage: &TokenUsage) {
    let data = object
        .entry("data")
        .or_insert_with(|| Value::Object(Map::new()));

    match data.as_object_mut() {
        Some(data) => {
            data.insert(
                "token_usage".to_string(),
                json!({
                    "input_tokens": usage.input_tokens,
                    "output_tokens": usage.output_tokens,
                    "total_tokens": usage.total_tokens,
                }),
            );
        }
        None => warn!("Model `data` field is not an object, token usage not attached"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn usage() -> TokenUsage {
        TokenUsage {
            input_tokens: 120,
            output_tokens: 30,
            total_tokens: 150,
        }
    }

    #[test]
    fn test_strips_json_fence() {
        let value = normalize_model_output("```json\n{\"a\":1}\n```", None).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_strips_fence_case_insensitively() {
        let value = normalize_model_output("  ```JSON\n{\"a\": true}```  ", None).unwrap();
        assert_eq!(value, json!({"a": true}));
    }

    #[test]
    fn test_array_keeps_first_element() {
        let value = normalize_model_output(r#"[{"a":1},{"a":2}]"#, None).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_unparseable_text_is_malformed() {
        let err = normalize_model_output("not json", None).unwrap_err();
        assert!(matches!(err, FallbackError::MalformedModelOutput(_)));
        assert_eq!(normalize_reply(&ModelReply::new("not json")), None);
    }

    #[test]
    fn test_empty_inputs_are_malformed() {
        assert_eq!(normalize_reply(&ModelReply::new("")), None);
        assert_eq!(normalize_reply(&ModelReply::new("```json\n```")), None);
        assert_eq!(normalize_reply(&ModelReply::new("[]")), None);
        assert_eq!(normalize_reply(&ModelReply::new("42")), None);
    }

    #[test]
    fn test_usage_creates_data_field() {
        let value = normalize_model_output(r#"{"is_success": true}"#, Some(&usage())).unwrap();
        assert_eq!(
            value,
            json!({
                "is_success": true,
                "data": {
                    "token_usage": {"input_tokens": 120, "output_tokens": 30, "total_tokens": 150}
                }
            })
        );
    }

    #[test]
    fn test_usage_keeps_existing_data() {
        let raw = r#"{"is_success": true, "data": {"total_item_count": 2, "pagewise_line_items": []}}"#;
        let value = normalize_model_output(raw, Some(&usage())).unwrap();

        assert_eq!(value["data"]["total_item_count"], json!(2));
        assert_eq!(value["data"]["pagewise_line_items"], json!([]));
        assert_eq!(value["data"]["token_usage"]["total_tokens"], json!(150));
    }

    #[test]
    fn test_usage_replaces_model_written_token_usage() {
        let raw = r#"{"data": {"total_item_count": 1, "token_usage": {"total_tokens": 9999}}}"#;
        let value = normalize_model_output(raw, Some(&usage())).unwrap();

        assert_eq!(
            value,
            json!({
                "data": {
                    "total_item_count": 1,
                    "token_usage": {"input_tokens": 120, "output_tokens": 30, "total_tokens": 150}
                }
            })
        );
    }

    #[test]
    fn test_model_token_usage_kept_without_counters() {
        let raw = r#"{"data": {"token_usage": {"total_tokens": 9999}}}"#;
        let value = normalize_model_output(raw, None).unwrap();
        assert_eq!(value["data"]["token_usage"], json!({"total_tokens": 9999}));
    }

    #[test]
    fn test_non_object_data_is_left_alone() {
        let value = normalize_model_output(r#"{"data": [1, 2]}"#, Some(&usage())).unwrap();
        assert_eq!(value, json!({"data": [1, 2]}));
    }
}
