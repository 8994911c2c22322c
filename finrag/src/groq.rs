//! Answer generator for Groq and other OpenAI-compatible chat completion APIs.
//!
//! This module is only available when the `groq` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RagError, Result};
use crate::generator::AnswerGenerator;
use crate::http::{CompatClient, api_key_from_env};

/// The Groq OpenAI-compatible API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default Groq chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama3-70b-8192";

/// The default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

const PROVIDER: &str = "Groq";

/// An [`AnswerGenerator`] calling `{base_url}/chat/completions`.
///
/// The composed prompt is sent as a single user message.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::groq::GroqAnswerGenerator;
///
/// let generator = GroqAnswerGenerator::from_env()?.with_temperature(0.1);
/// let answer = generator.generate("What did I spend on rent?").await?;
/// ```
pub struct GroqAnswerGenerator {
    http: CompatClient,
    model: String,
    temperature: f32,
}

impl GroqAnswerGenerator {
    /// Create a generator with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: CompatClient::new(PROVIDER, api_key.into(), GROQ_API_BASE)?,
            model: DEFAULT_GROQ_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a generator using the `GROQ_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env("GROQ_API_KEY")?)
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Point the generator at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.http.set_base_url(base_url.as_ref());
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_answer(self) -> Option<String> {
        self.choices.into_iter().find_map(|choice| choice.message.content)
    }
}

fn generation_error(message: impl Into<String>) -> RagError {
    RagError::GenerationError { provider: PROVIDER.into(), message: message.into() }
}

#[async_trait]
impl AnswerGenerator for GroqAnswerGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage { role: "user", content: prompt }],
        };
        let response: ChatResponse =
            self.http.post_json("chat/completions", &body).await.map_err(generation_error)?;

        response.into_answer().ok_or_else(|| generation_error("response contained no answer"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_api_key() {
        assert!(matches!(GroqAnswerGenerator::new("  "), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn request_body_carries_model_temperature_and_prompt() {
        let body = ChatRequest {
            model: DEFAULT_GROQ_MODEL,
            temperature: 0.1,
            messages: [ChatMessage { role: "user", content: "hi" }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-70b-8192");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn parses_first_non_empty_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null}},{"message":{"content":"You spent $50."}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_answer().as_deref(), Some("You spent $50."));
    }
}
