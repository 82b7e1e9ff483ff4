//! OpenAI provider adapter.

use super::openai_compat::chat_completion;
use async_trait::async_trait;
use conclave_application::ports::provider::{ProviderError, ProviderPort, check_request};
use conclave_domain::{
    CompletionRequest, CompletionResponse, ModelCapabilities, ProviderKind,
};
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    models: Vec<ModelCapabilities>,
}

impl OpenAiProvider {
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

    /// Construct from the environment; `None` (and no registration) when the
    /// key is absent.
    pub fn from_env(base_url_override: Option<&str>) -> Option<Self> {
        let api_key = read_key(API_KEY_ENV)?;
        info!("OpenAI provider configured");
        Some(match base_url_override {
            Some(url) => Self::with_base_url(api_key, url),
            None => Self::new(api_key),
        })
    }
}

#[async_trait]
impl ProviderPort for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn capabilities(&self) -> &[ModelCapabilities] {
        &self.models
    }

    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let caps = check_request(ProviderKind::OpenAi, &self.models, &request)?;
        chat_completion(
            &self.client,
            &self.base_url,
            &self.api_key,
            ProviderKind::OpenAi,
            caps,
            request,
        )
        .await
    }
}

pub(crate) fn read_key(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn model_catalog() -> Vec<ModelCapabilities> {
    vec![
        ModelCapabilities::new("o3", "OpenAI (o3)", ProviderKind::OpenAi)
            .with_context_window(200_000)
            .with_max_output_tokens(100_000)
            .with_extended_thinking()
            .with_function_calling()
            .with_json_mode()
            .with_images(20_000_000)
            .without_temperature()
            .with_intelligence_score(19)
            .with_code_generation(),
        ModelCapabilities::new("o4-mini", "OpenAI (o4-mini)", ProviderKind::OpenAi)
            .with_aliases(&["mini", "o4mini"])
            .with_context_window(200_000)
            .with_max_output_tokens(100_000)
            .with_extended_thinking()
            .with_function_calling()
            .with_json_mode()
            .with_images(20_000_000)
            .without_temperature()
            .with_intelligence_score(12),
        ModelCapabilities::new("gpt-4.1", "OpenAI (GPT-4.1)", ProviderKind::OpenAi)
            .with_aliases(&["gpt4.1"])
            .with_context_window(1_000_000)
            .with_max_output_tokens(32_768)
            .with_function_calling()
            .with_json_mode()
            .with_images(20_000_000)
            .with_intelligence_score(13)
            .with_code_generation(),
    ]
}
