//! Thinking-mode depth requested by a client.

use serde::{Deserialize, Serialize};

/// How much reasoning budget the client wants the model to spend.
///
/// Providers that support extended thinking translate this into their own
/// budget parameter; others ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingMode {
    Minimal,
    Low,
    Medium,
    High,
    Max,
}

impl ThinkingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThinkingMode::Minimal => "minimal",
            ThinkingMode::Low => "low",
            ThinkingMode::Medium => "medium",
            ThinkingMode::High => "high",
            ThinkingMode::Max => "max",
        }
    }

    /// Fraction of the model's output budget to allocate to thinking.
    pub fn budget_fraction(&self) -> f32 {
        match self {
            ThinkingMode::Minimal => 0.005,
            ThinkingMode::Low => 0.08,
            ThinkingMode::Medium => 0.33,
            ThinkingMode::High => 0.67,
            ThinkingMode::Max => 1.0,
        }
    }
}

impl std::fmt::Display for ThinkingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThinkingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(ThinkingMode::Minimal),
            "low" => Ok(ThinkingMode::Low),
            "medium" => Ok(ThinkingMode::Medium),
            "high" => Ok(ThinkingMode::High),
            "max" => Ok(ThinkingMode::Max),
            other => Err(format!("unknown thinking mode: {}", other)),
        }
    }
}
