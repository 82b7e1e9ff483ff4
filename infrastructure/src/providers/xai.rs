//! X.AI (Grok) provider adapter.
//!
//! X.AI exposes an OpenAI-compatible API at `https://api.x.ai/v1`. One model
//! is served: the non-reasoning Grok variant tuned for instant responses,
//! reachable under a family of shorthand aliases.

use super::openai::read_key;
use super::openai_compat::chat_completion;
use async_trait::async_trait;
use conclave_application::ports::provider::{ProviderError, ProviderPort, check_request};
use conclave_domain::{
    CompletionRequest, CompletionResponse, ModelCapabilities, ProviderKind,
};
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";

/// Environment variable holding the X.AI API key.
pub const API_KEY_ENV: &str = "XAI_API_KEY";

pub struct XaiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    models: Vec<ModelCapabilities>,
}

impl XaiProvider {
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
        let api_key = read_key(API_KEY_ENV)?;
        info!("X.AI provider configured");
        Some(match base_url_override {
            Some(url) => Self::with_base_url(api_key, url),
            None => Self::new(api_key),
        })
    }
}

#[async_trait]
impl ProviderPort for XaiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::XAi
    }

    fn capabilities(&self) -> &[ModelCapabilities] {
        &self.models
    }

    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let caps = check_request(ProviderKind::XAi, &self.models, &request)?;
        chat_completion(
            &self.client,
            &self.base_url,
            &self.api_key,
            ProviderKind::XAi,
            caps,
            request,
        )
        .await
    }
}

fn model_catalog() -> Vec<ModelCapabilities> {
    vec![
        ModelCapabilities::new(
            "grok-4-1-fast-non-reasoning",
            "X.AI (Grok 4.1 Fast Non-Reasoning)",
            ProviderKind::XAi,
        )
        .with_aliases(&[
            "grok",
            "grok4",
            "grok41",
            "grokfast",
            "grokcode",
            "grokheavy",
            "grok-4-1-fast-non-reasoning-latest",
        ])
        .with_context_window(2_000_000)
        .with_max_output_tokens(32_768)
        .with_function_calling()
        .with_json_mode()
        .with_images(20_000_000)
        .with_intelligence_score(11),
    ]
}
