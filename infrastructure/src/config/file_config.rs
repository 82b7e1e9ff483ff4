//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; translation into runtime policy happens
//! in the server binary.

use conclave_domain::{Severity, ValidationIssue};
use serde::{Deserialize, Serialize};

/// Per-provider endpoint settings (`[providers.gemini]` etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderEndpoint {
    /// Whether to register this provider even when its key is present.
    pub enabled: bool,
    /// Override of the vendor base URL (e.g. for proxies).
    pub base_url: Option<String>,
}

impl Default for FileProviderEndpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

/// `[providers]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub gemini: FileProviderEndpoint,
    pub openai: FileProviderEndpoint,
    pub xai: FileProviderEndpoint,
}

/// `[restrictions]` section: global allow/deny lists over canonical model
/// names or provider kinds. Per-provider allow-lists come from the
/// environment, not the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRestrictionsConfig {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

/// `[expert]` section: expert-validation model override for workflow tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExpertConfig {
    /// Model name or alias; unset selects by the reasoning category.
    pub model: Option<String>,
}

/// Root of the TOML configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: FileProvidersConfig,
    pub restrictions: FileRestrictionsConfig,
    pub expert: FileExpertConfig,
}

impl FileConfig {
    /// Validate the configuration, returning a list of issues.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (field, entries) in [
            ("restrictions.allow", &self.restrictions.allow),
            ("restrictions.deny", &self.restrictions.deny),
        ] {
            for entry in entries {
                if entry.trim().is_empty() {
                    issues.push(ValidationIssue {
                        severity: Severity::Error,
                        message: format!("{}: empty entry", field),
                    });
                }
            }
        }

        if let Some(ref model) = self.expert.model
            && model.trim().is_empty()
        {
            issues.push(ValidationIssue {
                severity: Severity::Error,
                message: "expert.model: must not be empty when set".to_string(),
            });
        }

        if !self.providers.gemini.enabled
            && !self.providers.openai.enabled
            && !self.providers.xai.enabled
        {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                message: "all providers are disabled; no tools will be able to run".to_string(),
            });
        }

        issues
    }
}
