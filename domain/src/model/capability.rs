//! Per-model capability descriptors (Value Objects).
//!
//! A [`ModelCapabilities`] record is the authoritative description of one
//! model: its canonical name, aliases, window sizes, feature flags, and the
//! intelligence score that drives auto-mode ranking. Descriptors are declared
//! statically by each provider adapter and never mutated after registration.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifies which vendor backend owns a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    XAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::XAi => "xai",
        }
    }

    /// Human-facing vendor name.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::XAi => "X.AI",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "xai" | "x.ai" | "grok" => Ok(ProviderKind::XAi),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Immutable capability descriptor for one model.
///
/// Invariants checked by [`validate`](Self::validate):
/// - `max_output_tokens <= context_window`
/// - `intelligence_score` in `1..=20`
/// - `max_image_bytes == 0` when `supports_images` is false
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Canonical model identifier sent to the vendor API.
    pub model_name: String,
    /// Human-facing name, e.g. "Gemini 2.5 Pro".
    pub friendly_name: String,
    /// Shorthand names resolving to this model (case-insensitive).
    pub aliases: Vec<String>,
    /// Total context window in tokens.
    pub context_window: u32,
    /// Maximum tokens the model will emit in one response.
    pub max_output_tokens: u32,
    pub supports_extended_thinking: bool,
    pub supports_system_prompts: bool,
    pub supports_streaming: bool,
    pub supports_function_calling: bool,
    pub supports_json_mode: bool,
    pub supports_images: bool,
    pub supports_temperature: bool,
    /// Largest accepted image payload; 0 when images are unsupported.
    pub max_image_bytes: u64,
    /// Relative capability rank in `1..=20`, drives auto-mode selection.
    pub intelligence_score: u8,
    /// Whether auto-mode may pick this model for code-writing tasks.
    pub allow_code_generation: bool,
    /// The vendor backend that owns this model.
    pub provider: ProviderKind,
}

impl ModelCapabilities {
    /// Create a descriptor with conservative defaults; refine with builders.
    pub fn new(
        model_name: impl Into<String>,
        friendly_name: impl Into<String>,
        provider: ProviderKind,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            friendly_name: friendly_name.into(),
            aliases: Vec::new(),
            context_window: 128_000,
            max_output_tokens: 8_192,
            supports_extended_thinking: false,
            supports_system_prompts: true,
            supports_streaming: true,
            supports_function_calling: false,
            supports_json_mode: false,
            supports_images: false,
            supports_temperature: true,
            max_image_bytes: 0,
            intelligence_score: 10,
            allow_code_generation: false,
            provider,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_extended_thinking(mut self) -> Self {
        self.supports_extended_thinking = true;
        self
    }

    pub fn with_function_calling(mut self) -> Self {
        self.supports_function_calling = true;
        self
    }

    pub fn with_json_mode(mut self) -> Self {
        self.supports_json_mode = true;
        self
    }

    /// Enable image input with the given payload cap.
    pub fn with_images(mut self, max_bytes: u64) -> Self {
        self.supports_images = true;
        self.max_image_bytes = max_bytes;
        self
    }

    pub fn without_temperature(mut self) -> Self {
        self.supports_temperature = false;
        self
    }

    pub fn with_intelligence_score(mut self, score: u8) -> Self {
        self.intelligence_score = score;
        self
    }

    pub fn with_code_generation(mut self) -> Self {
        self.allow_code_generation = true;
        self
    }

    /// Case-insensitive match against the canonical name.
    pub fn is_canonical(&self, name: &str) -> bool {
        self.model_name.eq_ignore_ascii_case(name)
    }

    /// Case-insensitive match against any alias.
    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Whether `name` resolves to this model (canonical or alias).
    pub fn matches(&self, name: &str) -> bool {
        self.is_canonical(name) || self.has_alias(name)
    }

    /// Validate descriptor invariants, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.context_window == 0 {
            issues.push(format!("{}: context_window must be positive", self.model_name));
        }
        if self.max_output_tokens == 0 {
            issues.push(format!(
                "{}: max_output_tokens must be positive",
                self.model_name
            ));
        }
        if self.max_output_tokens > self.context_window {
            issues.push(format!(
                "{}: max_output_tokens ({}) exceeds context_window ({})",
                self.model_name, self.max_output_tokens, self.context_window
            ));
        }
        if !(1..=20).contains(&self.intelligence_score) {
            issues.push(format!(
                "{}: intelligence_score ({}) must be in 1..=20",
                self.model_name, self.intelligence_score
            ));
        }
        if !self.supports_images && self.max_image_bytes != 0 {
            issues.push(format!(
                "{}: max_image_bytes must be 0 when images are unsupported",
                self.model_name
            ));
        }
        issues
    }

    /// Auto-mode ranking: higher intelligence first, larger window breaks
    /// ties, canonical name keeps the order stable.
    pub fn rank(a: &ModelCapabilities, b: &ModelCapabilities) -> Ordering {
        b.intelligence_score
            .cmp(&a.intelligence_score)
            .then_with(|| b.context_window.cmp(&a.context_window))
            .then_with(|| a.model_name.cmp(&b.model_name))
    }
}
