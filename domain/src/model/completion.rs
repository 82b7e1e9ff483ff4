//! Provider-bound request and normalized response types.
//!
//! Every vendor adapter accepts a [`CompletionRequest`] and returns a
//! [`CompletionResponse`], so callers see identical structure regardless of
//! which backend answered.

use crate::model::ProviderKind;
use crate::request::ThinkingMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Role of a chat message on the provider wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message bound for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A fully-resolved request for one `generate` call.
///
/// `model` is always a canonical name; alias resolution happens in the
/// registry before a request is constructed.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub thinking_mode: Option<ThinkingMode>,
    pub images: Vec<PathBuf>,
    /// Override of the descriptor's output cap, when a tool wants less.
    pub max_output_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            system_prompt: None,
            temperature: None,
            thinking_mode: None,
            images: Vec::new(),
            max_output_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_thinking_mode(mut self, mode: ThinkingMode) -> Self {
        self.thinking_mode = Some(mode);
        self
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of response.
    Stop,
    /// Output cap reached; the response may be truncated.
    Length,
    /// Provider filtered the content.
    ContentFilter,
    /// Provider-specific reason, passed through verbatim.
    Other(String),
}

impl FinishReason {
    /// Map a vendor finish-reason string onto the normalized enum.
    pub fn from_wire(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "stop" | "end_turn" | "finish" => FinishReason::Stop,
            "length" | "max_tokens" | "max_output_tokens" => FinishReason::Length,
            "content_filter" | "safety" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Normalized response from any provider backend.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
    /// Canonical model name that actually answered.
    pub model_name: String,
    pub provider: ProviderKind,
    /// Raw vendor payload for diagnostics; never inspected by the core.
    pub raw: Option<serde_json::Value>,
}

impl CompletionResponse {
    pub fn new(
        content: impl Into<String>,
        model_name: impl Into<String>,
        provider: ProviderKind,
    ) -> Self {
        Self {
            content: content.into(),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
            model_name: model_name.into(),
            provider,
            raw: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, MessageRole::System);
        assert_eq!(ChatMessage::user("u").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("a").role, MessageRole::Assistant);
    }

    #[test]
    fn finish_reason_from_wire_normalizes_vendor_spellings() {
        assert_eq!(FinishReason::from_wire("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("end_turn"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("max_tokens"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_wire("recitation"),
            FinishReason::Other("recitation".to_string())
        );
    }

    #[test]
    fn token_usage_totals() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn completion_request_builder() {
        let request = CompletionRequest::new("gemini-2.5-pro", vec![ChatMessage::user("hi")])
            .with_system_prompt("be terse")
            .with_temperature(0.3);

        assert_eq!(request.model, "gemini-2.5-pro");
        assert_eq!(request.system_prompt.as_deref(), Some("be terse"));
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.images.is_empty());
    }
}
