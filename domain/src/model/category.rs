//! Tool categories used by auto-mode model selection.

use crate::model::ModelCapabilities;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum context window for a model to qualify as long-context.
const LONG_CONTEXT_FLOOR: u32 = 400_000;

/// Coarse task class a tool declares; auto-mode filters candidates by the
/// capability flags the category requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Latency-sensitive, shallow tasks.
    Fast,
    /// Deep analysis needing extended thinking.
    Reasoning,
    /// Code-writing tasks.
    Coding,
    /// Tasks with image inputs.
    Vision,
    /// Tasks whose context exceeds ordinary windows.
    LongContext,
    /// Everything else.
    General,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Fast => "fast",
            ToolCategory::Reasoning => "reasoning",
            ToolCategory::Coding => "coding",
            ToolCategory::Vision => "vision",
            ToolCategory::LongContext => "long_context",
            ToolCategory::General => "general",
        }
    }

    /// Whether a model's capability set satisfies this category.
    pub fn admits(&self, capabilities: &ModelCapabilities) -> bool {
        match self {
            ToolCategory::Fast | ToolCategory::General => true,
            ToolCategory::Reasoning => capabilities.supports_extended_thinking,
            ToolCategory::Coding => capabilities.allow_code_generation,
            ToolCategory::Vision => capabilities.supports_images,
            ToolCategory::LongContext => capabilities.context_window >= LONG_CONTEXT_FLOOR,
        }
    }

    /// Default per-call wall-clock limit for `generate`; config may override.
    pub fn default_timeout(&self) -> Duration {
        match self {
            ToolCategory::Fast => Duration::from_secs(60),
            ToolCategory::Reasoning => Duration::from_secs(300),
            ToolCategory::LongContext => Duration::from_secs(180),
            ToolCategory::Coding | ToolCategory::Vision | ToolCategory::General => {
                Duration::from_secs(120)
            }
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(ToolCategory::Fast),
            "reasoning" => Ok(ToolCategory::Reasoning),
            "coding" => Ok(ToolCategory::Coding),
            "vision" => Ok(ToolCategory::Vision),
            "long_context" | "longcontext" => Ok(ToolCategory::LongContext),
            "general" => Ok(ToolCategory::General),
            other => Err(format!("unknown tool category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderKind;

    #[test]
    fn vision_requires_image_support() {
        let plain = ModelCapabilities::new("text-only", "Text", ProviderKind::OpenAi);
        let vision =
            ModelCapabilities::new("seeing", "Seeing", ProviderKind::Gemini).with_images(20_000_000);

        assert!(!ToolCategory::Vision.admits(&plain));
        assert!(ToolCategory::Vision.admits(&vision));
    }

    #[test]
    fn reasoning_requires_extended_thinking() {
        let plain = ModelCapabilities::new("plain", "Plain", ProviderKind::XAi);
        let thinker =
            ModelCapabilities::new("thinker", "Thinker", ProviderKind::OpenAi).with_extended_thinking();

        assert!(!ToolCategory::Reasoning.admits(&plain));
        assert!(ToolCategory::Reasoning.admits(&thinker));
    }

    #[test]
    fn long_context_requires_large_window() {
        let small = ModelCapabilities::new("small", "Small", ProviderKind::OpenAi)
            .with_context_window(200_000);
        let large = ModelCapabilities::new("large", "Large", ProviderKind::Gemini)
            .with_context_window(1_000_000);

        assert!(!ToolCategory::LongContext.admits(&small));
        assert!(ToolCategory::LongContext.admits(&large));
    }

    #[test]
    fn fast_and_general_admit_anything() {
        let caps = ModelCapabilities::new("anything", "Anything", ProviderKind::XAi);
        assert!(ToolCategory::Fast.admits(&caps));
        assert!(ToolCategory::General.admits(&caps));
    }

    #[test]
    fn category_round_trip() {
        for cat in [
            ToolCategory::Fast,
            ToolCategory::Reasoning,
            ToolCategory::Coding,
            ToolCategory::Vision,
            ToolCategory::LongContext,
            ToolCategory::General,
        ] {
            let parsed: ToolCategory = cat.as_str().parse().unwrap();
            assert_eq!(parsed, cat);
        }
    }

    #[test]
    fn timeouts_scale_with_category() {
        assert!(ToolCategory::Reasoning.default_timeout() > ToolCategory::Fast.default_timeout());
    }
}
