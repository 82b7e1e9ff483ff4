//! Configuration validation issues.

use serde::{Deserialize, Serialize};

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Startup continues; the message is shown once.
    Warning,
    /// Startup aborts.
    Error,
}

/// A single finding from configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Whether any issue in the list is an error.
    pub fn has_errors(issues: &[ValidationIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_distinguishes_severities() {
        let warnings = vec![ValidationIssue::warning("minor")];
        assert!(!ValidationIssue::has_errors(&warnings));

        let mixed = vec![
            ValidationIssue::warning("minor"),
            ValidationIssue::error("fatal"),
        ];
        assert!(ValidationIssue::has_errors(&mixed));
    }
}
