//! Shared machinery for OpenAI-compatible chat-completions APIs.
//!
//! OpenAI and X.AI speak the same wire dialect; both adapters delegate here
//! and differ only in base URL, credentials, and descriptor tables.

use super::{classify_status, encode_image, transport_error};
use conclave_application::ports::provider::ProviderError;
use conclave_domain::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ModelCapabilities, ProviderKind, ThinkingMode, TokenUsage,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Wire request for `POST {base}/chat/completions`.
#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Map a thinking mode onto the `reasoning_effort` parameter.
pub(crate) fn reasoning_effort(mode: ThinkingMode) -> &'static str {
    match mode {
        ThinkingMode::Minimal | ThinkingMode::Low => "low",
        ThinkingMode::Medium => "medium",
        ThinkingMode::High | ThinkingMode::Max => "high",
    }
}

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Build the wire message list: system prompt first, then the conversation,
/// with images attached to the final user message as data URIs.
fn build_messages(
    caps: &ModelCapabilities,
    request: &CompletionRequest,
) -> Result<Vec<serde_json::Value>, ProviderError> {
    let mut wire: Vec<serde_json::Value> = Vec::new();
    if let Some(ref system) = request.system_prompt {
        wire.push(json!({ "role": "system", "content": system }));
    }
    for message in &request.messages {
        wire.push(message_to_wire(message));
    }

    if !request.images.is_empty() {
        let mut parts: Vec<serde_json::Value> = Vec::new();
        let trailing_user_text = match wire.last() {
            Some(last) if last["role"] == "user" => {
                last["content"].as_str().map(|text| text.to_string())
            }
            _ => None,
        };
        if let Some(text) = trailing_user_text {
            wire.pop();
            parts.push(json!({ "type": "text", "text": text }));
        }
        for path in &request.images {
            let (mime, data) = encode_image(&caps.model_name, path, caps.max_image_bytes)?;
            parts.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{};base64,{}", mime, data) },
            }));
        }
        wire.push(json!({ "role": "user", "content": parts }));
    }
    Ok(wire)
}

fn message_to_wire(message: &ChatMessage) -> serde_json::Value {
    json!({ "role": role_str(message.role), "content": message.content })
}

/// Issue one chat-completions call and normalize the response.
pub(crate) async fn chat_completion(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    provider: ProviderKind,
    caps: &ModelCapabilities,
    request: CompletionRequest,
) -> Result<CompletionResponse, ProviderError> {
    let body = WireRequest {
        model: request.model.clone(),
        messages: build_messages(caps, &request)?,
        temperature: request.temperature,
        max_completion_tokens: request.max_output_tokens.or(Some(caps.max_output_tokens)),
        reasoning_effort: request.thinking_mode.map(reasoning_effort),
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| transport_error(provider.as_str(), e))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(provider.as_str(), e))?;
    if status != 200 {
        return Err(classify_status(provider.as_str(), status, &text));
    }

    parse_response(provider, &request.model, &text)
}

/// Parse a chat-completions body into the normalized response.
pub(crate) fn parse_response(
    provider: ProviderKind,
    requested_model: &str,
    body: &str,
) -> Result<CompletionResponse, ProviderError> {
    let wire: WireResponse = serde_json::from_str(body).map_err(|e| ProviderError::Upstream {
        message: format!("{} returned an unparseable body: {}", provider, e),
        retryable: false,
    })?;

    let choice = wire.choices.into_iter().next().ok_or(ProviderError::Upstream {
        message: format!("{} returned no choices", provider),
        retryable: false,
    })?;

    let usage = wire
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();
    let finish = choice
        .finish_reason
        .as_deref()
        .map(FinishReason::from_wire)
        .unwrap_or(FinishReason::Stop);

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: finish,
        usage,
        model_name: wire.model.unwrap_or_else(|| requested_model.to_string()),
        provider,
        raw: serde_json::from_str(body).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_effort_collapses_the_scale() {
        assert_eq!(reasoning_effort(ThinkingMode::Minimal), "low");
        assert_eq!(reasoning_effort(ThinkingMode::Medium), "medium");
        assert_eq!(reasoning_effort(ThinkingMode::Max), "high");
    }

    #[test]
    fn parse_response_extracts_content_and_usage() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "grok-4-1-fast-non-reasoning",
            "choices": [
                {"message": {"role": "assistant", "content": "4"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1}
        }"#;
        let response = parse_response(ProviderKind::XAi, "grok-4-1-fast-non-reasoning", body).unwrap();
        assert_eq!(response.content, "4");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 1);
        assert_eq!(response.model_name, "grok-4-1-fast-non-reasoning");
        assert_eq!(response.provider, ProviderKind::XAi);
    }

    #[test]
    fn parse_response_handles_length_finish() {
        let body = r#"{
            "choices": [
                {"message": {"content": "truncat"}, "finish_reason": "length"}
            ]
        }"#;
        let response = parse_response(ProviderKind::OpenAi, "gpt-4.1", body).unwrap();
        assert_eq!(response.finish_reason, FinishReason::Length);
        // Model falls back to the requested name when absent.
        assert_eq!(response.model_name, "gpt-4.1");
    }

    #[test]
    fn parse_response_rejects_empty_choices() {
        let body = r#"{"choices": []}"#;
        assert!(parse_response(ProviderKind::OpenAi, "gpt-4.1", body).is_err());
    }

    #[test]
    fn parse_response_rejects_garbage() {
        assert!(parse_response(ProviderKind::OpenAi, "gpt-4.1", "<html>").is_err());
    }

    #[test]
    fn system_prompt_leads_the_message_list() {
        let caps = ModelCapabilities::new("gpt-4.1", "GPT-4.1", ProviderKind::OpenAi);
        let request = CompletionRequest::new("gpt-4.1", vec![ChatMessage::user("hello")])
            .with_system_prompt("be brief");
        let wire = build_messages(&caps, &request).unwrap();
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[1]["content"], "hello");
    }
}
