//! Provider registry: name resolution and auto-mode selection.
//!
//! The registry holds the ordered list of configured providers. It is built
//! once at startup and shared immutably afterwards, so reads take no lock on
//! the hot path.

use super::restriction::RestrictionPolicy;
use crate::ports::provider::ProviderPort;
use conclave_domain::{ModelCapabilities, OrchestratorError, ProviderKind, ToolCategory};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of resolving a model name or alias.
#[derive(Clone)]
pub struct Resolution {
    pub provider: Arc<dyn ProviderPort>,
    pub capabilities: ModelCapabilities,
}

impl Resolution {
    /// Canonical name of the resolved model.
    pub fn canonical(&self) -> &str {
        &self.capabilities.model_name
    }
}

/// One provider's slice of the model catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCatalog {
    pub provider: ProviderKind,
    pub friendly_name: String,
    pub models: Vec<ModelSummary>,
}

/// Catalog entry for one model, as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub aliases: Vec<String>,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub intelligence_score: u8,
    pub supports_extended_thinking: bool,
    pub supports_images: bool,
    pub supports_json_mode: bool,
}

/// Registry of provider backends keyed by model names and aliases.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderPort>>,
    restrictions: RestrictionPolicy,
}

impl ProviderRegistry {
    pub fn new(restrictions: RestrictionPolicy) -> Self {
        Self {
            providers: Vec::new(),
            restrictions,
        }
    }

    /// Register a provider. Idempotent by provider kind: a second
    /// registration of the same vendor is ignored with a warning.
    pub fn register(&mut self, provider: Arc<dyn ProviderPort>) {
        if self.providers.iter().any(|p| p.kind() == provider.kind()) {
            warn!("provider {} already registered, ignoring", provider.kind());
            return;
        }
        debug!(
            "registered provider {} with {} models",
            provider.kind(),
            provider.capabilities().len()
        );
        self.providers.push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Resolve a model name or alias to its provider, case-insensitively.
    ///
    /// Canonical matches win over alias matches; within each pass the first
    /// registered provider wins. Restricted models fail `ModelRestricted`.
    pub fn resolve(&self, name: &str) -> Result<Resolution, OrchestratorError> {
        let found = self
            .find_by(|c| c.is_canonical(name))
            .or_else(|| self.find_by(|c| c.has_alias(name)));

        let Some(resolution) = found else {
            return Err(OrchestratorError::UnknownModel(name.to_string()));
        };

        if !self
            .restrictions
            .allows_requested(&resolution.capabilities, name)
        {
            return Err(OrchestratorError::ModelRestricted(name.to_string()));
        }
        Ok(resolution)
    }

    /// Canonical names of all selectable models.
    ///
    /// Providers are only registered when their credentials are configured,
    /// so registration implies availability; the restriction policy filters
    /// the rest.
    pub fn list_available(&self) -> Vec<String> {
        self.providers
            .iter()
            .flat_map(|p| p.capabilities())
            .filter(|c| self.restrictions.allows_model(c))
            .map(|c| c.model_name.clone())
            .collect()
    }

    /// Auto-mode: pick the best model for a category.
    ///
    /// Candidates must be available, pass the category's capability filter,
    /// and survive the restriction policy; the winner has the highest
    /// intelligence score (window size, then name, break ties).
    pub fn select_auto(&self, category: ToolCategory) -> Result<Resolution, OrchestratorError> {
        let mut candidates: Vec<Resolution> = Vec::new();
        for provider in &self.providers {
            for caps in provider.capabilities() {
                if category.admits(caps) && self.restrictions.allows_model(caps) {
                    candidates.push(Resolution {
                        provider: Arc::clone(provider),
                        capabilities: caps.clone(),
                    });
                }
            }
        }
        candidates.sort_by(|a, b| ModelCapabilities::rank(&a.capabilities, &b.capabilities));

        let Some(winner) = candidates.into_iter().next() else {
            return Err(OrchestratorError::NoEligibleModel(category));
        };
        debug!(
            "auto-mode selected {} for category {}",
            winner.canonical(),
            category
        );
        Ok(winner)
    }

    /// Catalog of every selectable model, grouped by provider.
    pub fn catalog(&self) -> Vec<ProviderCatalog> {
        self.providers
            .iter()
            .map(|provider| ProviderCatalog {
                provider: provider.kind(),
                friendly_name: provider.kind().friendly_name().to_string(),
                models: provider
                    .capabilities()
                    .iter()
                    .filter(|c| self.restrictions.allows_model(c))
                    .map(|c| ModelSummary {
                        name: c.model_name.clone(),
                        aliases: c.aliases.clone(),
                        context_window: c.context_window,
                        max_output_tokens: c.max_output_tokens,
                        intelligence_score: c.intelligence_score,
                        supports_extended_thinking: c.supports_extended_thinking,
                        supports_images: c.supports_images,
                        supports_json_mode: c.supports_json_mode,
                    })
                    .collect(),
            })
            .collect()
    }

    fn find_by<F>(&self, predicate: F) -> Option<Resolution>
    where
        F: Fn(&ModelCapabilities) -> bool,
    {
        for provider in &self.providers {
            if let Some(caps) = provider.capabilities().iter().find(|c| predicate(c)) {
                return Some(Resolution {
                    provider: Arc::clone(provider),
                    capabilities: caps.clone(),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::provider::ProviderError;
    use async_trait::async_trait;
    use conclave_domain::{CompletionRequest, CompletionResponse};

    // -- Mock ProviderPort -----------------------------------------------------

    struct MockProvider {
        kind: ProviderKind,
        models: Vec<ModelCapabilities>,
    }

    impl MockProvider {
        fn new(kind: ProviderKind, models: Vec<ModelCapabilities>) -> Arc<dyn ProviderPort> {
            Arc::new(Self { kind, models })
        }
    }

    #[async_trait]
    impl ProviderPort for MockProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn capabilities(&self) -> &[ModelCapabilities] {
            &self.models
        }

        async fn generate(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::permanent("mock"))
        }
    }

    // -- Helpers ---------------------------------------------------------------

    fn gemini() -> Arc<dyn ProviderPort> {
        MockProvider::new(
            ProviderKind::Gemini,
            vec![
                ModelCapabilities::new("gemini-2.5-pro", "Gemini 2.5 Pro", ProviderKind::Gemini)
                    .with_aliases(&["pro"])
                    .with_context_window(1_048_576)
                    .with_max_output_tokens(65_536)
                    .with_extended_thinking()
                    .with_images(20_000_000)
                    .with_intelligence_score(18)
                    .with_code_generation(),
                ModelCapabilities::new("gemini-2.5-flash", "Gemini 2.5 Flash", ProviderKind::Gemini)
                    .with_aliases(&["flash"])
                    .with_context_window(1_048_576)
                    .with_max_output_tokens(65_536)
                    .with_intelligence_score(10),
            ],
        )
    }

    fn xai() -> Arc<dyn ProviderPort> {
        MockProvider::new(
            ProviderKind::XAi,
            vec![
                ModelCapabilities::new("grok-4-1-fast-non-reasoning", "Grok", ProviderKind::XAi)
                    .with_aliases(&["grok", "pro"]) // "pro" collides with gemini on purpose
                    .with_context_window(2_000_000)
                    .with_max_output_tokens(32_768)
                    .with_intelligence_score(11),
            ],
        )
    }

    fn registry(providers: Vec<Arc<dyn ProviderPort>>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new(RestrictionPolicy::allow_all());
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    // -- resolve ---------------------------------------------------------------

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = registry(vec![gemini()]);
        let lower = registry.resolve("pro").unwrap();
        let upper = registry.resolve("PRO").unwrap();
        assert_eq!(lower.canonical(), "gemini-2.5-pro");
        assert_eq!(upper.canonical(), "gemini-2.5-pro");
    }

    #[test]
    fn canonical_beats_alias_across_providers() {
        // "gemini-2.5-flash" is canonical on gemini; even though xai is
        // registered first, a canonical match anywhere wins over aliases.
        let registry = registry(vec![xai(), gemini()]);
        let resolution = registry.resolve("gemini-2.5-flash").unwrap();
        assert_eq!(resolution.provider.kind(), ProviderKind::Gemini);
    }

    #[test]
    fn alias_collision_first_registered_wins() {
        let registry1 = registry(vec![xai(), gemini()]);
        let resolution = registry1.resolve("pro").unwrap();
        assert_eq!(resolution.canonical(), "grok-4-1-fast-non-reasoning");

        let registry2 = registry(vec![gemini(), xai()]);
        let resolution = registry2.resolve("pro").unwrap();
        assert_eq!(resolution.canonical(), "gemini-2.5-pro");
    }

    #[test]
    fn unknown_model_errors() {
        let registry = registry(vec![gemini()]);
        assert!(matches!(
            registry.resolve("claude-opus"),
            Err(OrchestratorError::UnknownModel(_))
        ));
    }

    #[test]
    fn restricted_model_errors_on_explicit_resolve() {
        let mut registry = ProviderRegistry::new(
            RestrictionPolicy::default().with_provider_list(ProviderKind::Gemini, "flash"),
        );
        registry.register(gemini());

        assert!(matches!(
            registry.resolve("pro"),
            Err(OrchestratorError::ModelRestricted(_))
        ));
        assert!(registry.resolve("flash").is_ok());
    }

    #[test]
    fn duplicate_provider_registration_is_ignored() {
        let mut registry = ProviderRegistry::new(RestrictionPolicy::allow_all());
        registry.register(gemini());
        registry.register(gemini());
        assert_eq!(registry.provider_count(), 1);
    }

    // -- select_auto -----------------------------------------------------------

    #[test]
    fn auto_picks_highest_intelligence() {
        let registry = registry(vec![xai(), gemini()]);
        let winner = registry.select_auto(ToolCategory::General).unwrap();
        assert_eq!(winner.canonical(), "gemini-2.5-pro");
    }

    #[test]
    fn auto_respects_category_flags() {
        let registry = registry(vec![xai(), gemini()]);

        // Only gemini-2.5-pro supports extended thinking.
        let winner = registry.select_auto(ToolCategory::Reasoning).unwrap();
        assert_eq!(winner.canonical(), "gemini-2.5-pro");

        // Coding requires allow_code_generation.
        let winner = registry.select_auto(ToolCategory::Coding).unwrap();
        assert_eq!(winner.canonical(), "gemini-2.5-pro");
    }

    #[test]
    fn auto_fails_when_no_candidate_survives() {
        let registry = registry(vec![xai()]);
        assert!(matches!(
            registry.select_auto(ToolCategory::Reasoning),
            Err(OrchestratorError::NoEligibleModel(ToolCategory::Reasoning))
        ));
    }

    #[test]
    fn auto_skips_restricted_candidates() {
        let mut registry = ProviderRegistry::new(
            RestrictionPolicy::default().with_provider_list(ProviderKind::Gemini, "flash"),
        );
        registry.register(gemini());
        registry.register(xai());

        // gemini-2.5-pro (score 18) is blocked; grok (11) beats flash (10).
        let winner = registry.select_auto(ToolCategory::General).unwrap();
        assert_eq!(winner.canonical(), "grok-4-1-fast-non-reasoning");
    }

    // -- catalog ---------------------------------------------------------------

    #[test]
    fn list_available_unions_providers() {
        let registry = registry(vec![gemini(), xai()]);
        let names = registry.list_available();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"gemini-2.5-pro".to_string()));
        assert!(names.contains(&"grok-4-1-fast-non-reasoning".to_string()));
    }

    #[test]
    fn catalog_groups_by_provider_and_filters_restricted() {
        let mut registry = ProviderRegistry::new(
            RestrictionPolicy::default().with_provider_list(ProviderKind::Gemini, "flash"),
        );
        registry.register(gemini());

        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].provider, ProviderKind::Gemini);
        assert_eq!(catalog[0].models.len(), 1);
        assert_eq!(catalog[0].models[0].name, "gemini-2.5-flash");
    }
}
