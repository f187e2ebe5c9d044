//! Generative-model fallback for documents no heuristic understands.

mod gemini;
mod normalizer;
mod prompt;

pub use gemini::GeminiClient;
pub use normalizer::{normalize_model_output, normalize_reply, strip_code_fences};
pub use prompt::build_prompt;

use crate::error::FallbackError;
use crate::models::TokenUsage;

/// Result type for fallback operations.
pub type Result<T> = std::result::Result<T, FallbackError>;

/// Text generated by the model, plus token counters when reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Trait for generative-model backends.
pub trait GenerativeModel {
    /// Send one prompt and return the generated text.
    fn generate(&self, prompt: &str) -> Result<ModelReply>;
}

impl<M: GenerativeModel + ?Sized> GenerativeModel for &M {
    fn generate(&self, prompt: &str) -> Result<ModelReply> {
        (**self).generate(prompt)
    }
}

/// API key for the fallback model. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank values.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_blank() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        assert_eq!(ApiKey::new(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("secret-value").unwrap();
        assert!(!format!("{:?}", key).contains("secret"));
    }
}
