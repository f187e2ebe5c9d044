//! Gemini `generateContent` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiKey, GenerativeModel, ModelReply, Result};
use crate::error::FallbackError;
use crate::models::{FallbackConfig, TokenUsage};

/// Blocking client for the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate (empty when absent).
    fn into_reply(self) -> ModelReply {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        let usage = self.usage_metadata.map(|u| TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        ModelReply { text, usage }
    }
}

impl GeminiClient {
    /// Create a client from fallback settings and a resolved key.
    pub fn new(config: &FallbackConfig, api_key: ApiKey) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl GenerativeModel for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<ModelReply> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        info!("Calling {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FallbackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        let payload: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| FallbackError::InvalidResponse(e.to_string()))?;
        let reply = payload.into_reply();

        debug!(
            "Model replied with {} chars, usage: {:?}",
            reply.text.len(),
            reply.usage
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_from_response_body() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"a\": 1}"}], "role": "model"}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4, "totalTokenCount": 14}
        }"#;
        let payload: GenerateResponse = serde_json::from_str(body).unwrap();

        assert_eq!(
            payload.into_reply(),
            ModelReply::new("{\"a\": 1}").with_usage(TokenUsage {
                input_tokens: 10,
                output_tokens: 4,
                total_tokens: 14,
            })
        );
    }

    #[test]
    fn test_reply_without_candidates_is_empty() {
        let payload: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        let reply = payload.into_reply();

        assert_eq!(reply.text, "");
        assert_eq!(reply.usage, None);
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = FallbackConfig {
            endpoint: "https://example.test/v1beta/".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config, ApiKey::new("k").unwrap()).unwrap();

        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
