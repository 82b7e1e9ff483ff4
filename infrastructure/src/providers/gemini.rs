//! Google Gemini provider adapter.
//!
//! Gemini speaks its own `generateContent` dialect rather than the
//! chat-completions shape, so this adapter carries its own wire types.

use super::{classify_status, encode_image, transport_error};
use async_trait::async_trait;
use conclave_application::ports::provider::{ProviderError, ProviderPort, check_request};
use conclave_domain::{
    CompletionRequest, CompletionResponse, FinishReason, MessageRole, ModelCapabilities,
    ProviderKind, TokenUsage,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    models: Vec<ModelCapabilities>,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            models: model_catalog(),
        }
    }

    pub fn from_env(base_url_override: Option<&str>) -> Option<Self> {
        let api_key = super::openai::read_key(API_KEY_ENV)?;
        info!("Gemini provider configured");
        Some(match base_url_override {
            Some(url) => Self::with_base_url(api_key, url),
            None => Self::new(api_key),
        })
    }

    fn build_body(
        &self,
        caps: &ModelCapabilities,
        request: &CompletionRequest,
    ) -> Result<Value, ProviderError> {
        let mut contents: Vec<Value> = Vec::new();
        for message in &request.messages {
            let role = match message.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": message.content }],
            }));
        }

        if !request.images.is_empty() {
            let mut parts: Vec<Value> = Vec::new();
            for path in &request.images {
                let (mime, data) = encode_image(&caps.model_name, path, caps.max_image_bytes)?;
                parts.push(json!({ "inline_data": { "mime_type": mime, "data": data } }));
            }
            contents.push(json!({ "role": "user", "parts": parts }));
        }

        let mut generation_config = json!({
            "maxOutputTokens": request.max_output_tokens.unwrap_or(caps.max_output_tokens),
        });
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(mode) = request.thinking_mode {
            let budget =
                (caps.max_output_tokens as f32 * mode.budget_fraction()).round() as u32;
            generation_config["thinkingConfig"] = json!({ "thinkingBudget": budget });
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let Some(ref system) = request.system_prompt {
            body["system_instruction"] = json!({ "parts": [{ "text": system }] });
        }
        Ok(body)
    }
}

#[async_trait]
impl ProviderPort for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn capabilities(&self) -> &[ModelCapabilities] {
        &self.models
    }

    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let caps = check_request(ProviderKind::Gemini, &self.models, &request)?;
        let body = self.build_body(caps, &request)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            request.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error("gemini", e))?;
        if status != 200 {
            return Err(classify_status("gemini", status, &text));
        }

        parse_response(&request.model, &text)
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default, rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(default, rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}

fn parse_response(model: &str, body: &str) -> Result<CompletionResponse, ProviderError> {
    let wire: WireResponse = serde_json::from_str(body).map_err(|e| ProviderError::Upstream {
        message: format!("gemini returned an unparseable body: {}", e),
        retryable: false,
    })?;

    let candidate = wire.candidates.into_iter().next().ok_or(ProviderError::Upstream {
        message: "gemini returned no candidates".to_string(),
        retryable: false,
    })?;

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let finish = candidate
        .finish_reason
        .as_deref()
        .map(FinishReason::from_wire)
        .unwrap_or(FinishReason::Stop);
    let usage = wire
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        finish_reason: finish,
        usage,
        model_name: model.to_string(),
        provider: ProviderKind::Gemini,
        raw: serde_json::from_str(body).ok(),
    })
}

fn model_catalog() -> Vec<ModelCapabilities> {
    vec![
        ModelCapabilities::new("gemini-2.5-pro", "Gemini (2.5 Pro)", ProviderKind::Gemini)
            .with_aliases(&["pro", "gemini-pro", "gemini pro"])
            .with_context_window(1_048_576)
            .with_max_output_tokens(65_536)
            .with_extended_thinking()
            .with_function_calling()
            .with_json_mode()
            .with_images(20_000_000)
            .with_intelligence_score(18)
            .with_code_generation(),
        ModelCapabilities::new("gemini-2.5-flash", "Gemini (2.5 Flash)", ProviderKind::Gemini)
            .with_aliases(&["flash", "gemini-flash"])
            .with_context_window(1_048_576)
            .with_max_output_tokens(65_536)
            .with_extended_thinking()
            .with_function_calling()
            .with_json_mode()
            .with_images(20_000_000)
            .with_intelligence_score(10),
        ModelCapabilities::new(
            "gemini-2.0-flash-lite",
            "Gemini (2.0 Flash Lite)",
            ProviderKind::Gemini,
        )
        .with_aliases(&["flashlite", "flash-lite"])
        .with_context_window(1_048_576)
        .with_max_output_tokens(8_192)
        .with_json_mode()
        .with_intelligence_score(7),
    ]
}
