//! Completion provider abstraction and implementations.
//!
//! Defines the [`CompletionProvider`] trait and two implementations:
//! - **[`DisabledProvider`]**: always fails; used when no API key is
//!   configured so the rest of the CLI keeps working.
//! - **[`OpenAIProvider`]**: calls an OpenAI-compatible
//!   `POST {base_url}/chat/completions` endpoint with a blocking client.
//!
//! One request per question. No retries, and no timeout unless
//! `llm.timeout_secs` is set.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::CompletionError;

/// One chat completion call: a system message and a user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Opaque text-completion capability.
pub trait CompletionProvider: Send + Sync {
    /// Provider identifier (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Send the request and return the generated text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

// ============ Disabled Provider ============

/// A provider that always returns [`CompletionError::Disabled`].
pub struct DisabledProvider {
    reason: String,
}

impl DisabledProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CompletionProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Disabled(self.reason.clone()))
    }
}

// ============ OpenAI Provider ============

/// Chat completion provider for OpenAI-compatible APIs.
pub struct OpenAIProvider {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl OpenAIProvider {
    /// Build a provider from the `[llm]` config and a resolved API key.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": request.max_tokens,
        });

        debug!(model = %request.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CompletionError::Authentication(
                "invalid API key or insufficient permissions".into(),
            ));
        }
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "completion API returned an error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| CompletionError::Format(e.to_string()))?;
        parse_chat_response(&json)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a chat completion response.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<String, CompletionError> {
    let parsed: ChatResponse = serde_json::from_value(json.clone())
        .map_err(|e| CompletionError::Format(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::Format("no message content in response".into()))
}

/// Create the provider the config asks for.
///
/// Falls back to [`DisabledProvider`] when the provider is `"disabled"` or
/// no API key is available.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<String>,
) -> Result<Box<dyn CompletionProvider>, CompletionError> {
    match (config.provider.as_str(), api_key) {
        ("openai", Some(key)) => Ok(Box::new(OpenAIProvider::new(config, key)?)),
        ("openai", None) => Ok(Box::new(DisabledProvider::new(format!(
            "no API key configured; set {}",
            config.api_key_env
        )))),
        _ => Ok(Box::new(DisabledProvider::new(
            "llm.provider is \"disabled\"",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chat_response() {
        let json = json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "The cheetah." } }
            ]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "The cheetah.");
    }

    #[test]
    fn test_parse_chat_response_without_choices() {
        let json = json!({ "choices": [] });
        assert!(matches!(
            parse_chat_response(&json),
            Err(CompletionError::Format(_))
        ));
    }

    #[test]
    fn test_parse_chat_response_malformed() {
        let json = json!({ "error": { "message": "bad request" } });
        assert!(matches!(
            parse_chat_response(&json),
            Err(CompletionError::Format(_))
        ));
    }

    #[test]
    fn test_disabled_provider_always_fails() {
        let provider = DisabledProvider::new("no key");
        let request = CompletionRequest {
            system: "s".into(),
            prompt: "p".into(),
            model: "m".into(),
            max_tokens: 10,
        };
        let err = provider.complete(&request).unwrap_err();
        assert!(err.to_string().contains("no key"));
    }

    #[test]
    fn test_create_provider_without_key_is_disabled() {
        let config = LlmConfig::default();
        let provider = create_provider(&config, None).unwrap();
        assert_eq!(provider.name(), "disabled");
    }

    #[test]
    fn test_create_provider_with_key_is_openai() {
        let config = LlmConfig::default();
        let provider = create_provider(&config, Some("sk-test".into())).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_provider_respects_disabled_config() {
        let config = LlmConfig {
            provider: "disabled".into(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config, Some("sk-test".into())).unwrap();
        assert_eq!(provider.name(), "disabled");
    }
}
