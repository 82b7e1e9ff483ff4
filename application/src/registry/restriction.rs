//! Model restriction policy.
//!
//! Deployments limit which models tools may use through per-provider env
//! allow-lists (`GEMINI_ALLOWED_MODELS`, `OPENAI_ALLOWED_MODELS`,
//! `XAI_ALLOWED_MODELS`) plus an optional global allow/deny list from the
//! config file. Explicit selection of a blocked model fails with
//! `ModelRestricted`; auto-mode silently filters blocked candidates.

use conclave_domain::{ModelCapabilities, ProviderKind};
use std::collections::{HashMap, HashSet};

/// Environment variable holding the allow-list for a provider.
pub fn allowed_models_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "GEMINI_ALLOWED_MODELS",
        ProviderKind::OpenAi => "OPENAI_ALLOWED_MODELS",
        ProviderKind::XAi => "XAI_ALLOWED_MODELS",
    }
}

/// Configured allow/deny filtering over models.
#[derive(Debug, Clone, Default)]
pub struct RestrictionPolicy {
    /// Per-provider allow-lists; an absent or empty set allows everything.
    /// Entries are lowercased and may name canonicals or aliases.
    per_provider: HashMap<ProviderKind, HashSet<String>>,
    /// Global allow-list over canonical names or provider kinds; empty allows all.
    global_allow: HashSet<String>,
    /// Global deny-list over canonical names or provider kinds.
    global_deny: HashSet<String>,
}

impl RestrictionPolicy {
    /// Policy with no restrictions.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Read the per-provider allow-lists from the environment.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAi, ProviderKind::XAi] {
            if let Ok(raw) = std::env::var(allowed_models_env(kind)) {
                policy = policy.with_provider_list(kind, &raw);
            }
        }
        policy
    }

    /// Set a provider's allow-list from a comma-separated string.
    pub fn with_provider_list(mut self, kind: ProviderKind, raw: &str) -> Self {
        let entries: HashSet<String> = raw
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !entries.is_empty() {
            self.per_provider.insert(kind, entries);
        }
        self
    }

    /// Extend the global allow-list (canonical names or provider kinds).
    pub fn with_global_allow<I: IntoIterator<Item = String>>(mut self, entries: I) -> Self {
        self.global_allow
            .extend(entries.into_iter().map(|e| e.to_lowercase()));
        self
    }

    /// Extend the global deny-list (canonical names or provider kinds).
    pub fn with_global_deny<I: IntoIterator<Item = String>>(mut self, entries: I) -> Self {
        self.global_deny
            .extend(entries.into_iter().map(|e| e.to_lowercase()));
        self
    }

    /// Whether an explicit request for `requested` (canonical or alias,
    /// resolving to `capabilities`) is allowed.
    ///
    /// An allow-list entry admits the exact name it spells and, when it names
    /// the canonical, every alias that resolves to it. Listing only an alias
    /// admits that alias (and lookups of what it resolves to stay blocked).
    pub fn allows_requested(&self, capabilities: &ModelCapabilities, requested: &str) -> bool {
        if !self.globally_allowed(capabilities) {
            return false;
        }
        match self.per_provider.get(&capabilities.provider) {
            None => true,
            Some(set) => {
                set.contains(&requested.to_lowercase())
                    || set.contains(&capabilities.model_name.to_lowercase())
            }
        }
    }

    /// Whether a model is selectable at all, used by auto-mode and the
    /// catalog. True when any name (canonical or alias) is admitted.
    pub fn allows_model(&self, capabilities: &ModelCapabilities) -> bool {
        if !self.globally_allowed(capabilities) {
            return false;
        }
        match self.per_provider.get(&capabilities.provider) {
            None => true,
            Some(set) => {
                set.contains(&capabilities.model_name.to_lowercase())
                    || capabilities
                        .aliases
                        .iter()
                        .any(|a| set.contains(&a.to_lowercase()))
            }
        }
    }

    fn globally_allowed(&self, capabilities: &ModelCapabilities) -> bool {
        let canonical = capabilities.model_name.to_lowercase();
        let provider = capabilities.provider.as_str().to_string();
        if self.global_deny.contains(&canonical) || self.global_deny.contains(&provider) {
            return false;
        }
        self.global_allow.is_empty()
            || self.global_allow.contains(&canonical)
            || self.global_allow.contains(&provider)
    }
}
