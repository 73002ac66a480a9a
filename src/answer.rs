//! Answering facade: prompt template plus one completion call.
//!
//! [`answer`] never fails. Any provider error is turned into a
//! user-visible `Error querying LLM: ...` string so the REPL keeps going.

use tracing::{info, warn};

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::config::LlmConfig;

pub const SYSTEM_MESSAGE: &str = "You are a helpful sports biomechanics expert.";

/// Reply the model is told to give when the context is insufficient.
pub const NO_ANSWER: &str = "I don't have enough information to answer that.";

/// Model and output bound for each completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSettings {
    pub model: String,
    pub max_tokens: u32,
}

impl AnswerSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// User prompt embedding the retrieved context and the question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a sports biomechanics expert that analyzes running gaits of both humans and animals.\n\
         Use ONLY the following information to answer the question. If the information doesn't contain\n\
         the answer, say \"{NO_ANSWER}\"\n\
         \n\
         INFORMATION:\n\
         {context}\n\
         \n\
         QUESTION: {question}\n\
         \n\
         ANSWER:"
    )
}

/// Ask the provider to answer `question` from `context`.
pub fn answer(
    provider: &dyn CompletionProvider,
    settings: &AnswerSettings,
    context: &str,
    question: &str,
) -> String {
    let request = CompletionRequest {
        system: SYSTEM_MESSAGE.to_string(),
        prompt: build_prompt(context, question),
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
    };

    match provider.complete(&request) {
        Ok(text) => {
            info!(provider = provider.name(), chars = text.len(), "completion succeeded");
            text.trim().to_string()
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "completion failed");
            format!("Error querying LLM: {}", e)
        }
    }
}
