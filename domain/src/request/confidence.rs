//! Confidence levels reported by workflow steps.

use serde::{Deserialize, Serialize};

/// Client-asserted confidence in the current hypothesis.
///
/// The progression is ordered, but regressions are allowed: new evidence may
/// lower confidence. Only `Certain` changes control flow: it skips expert
/// validation at the terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    Exploring,
    Low,
    Medium,
    High,
    VeryHigh,
    AlmostCertain,
    Certain,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exploring => "exploring",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very_high",
            Confidence::AlmostCertain => "almost_certain",
            Confidence::Certain => "certain",
        }
    }

    /// Whether the client has asserted completeness.
    pub fn is_certain(&self) -> bool {
        matches!(self, Confidence::Certain)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exploring" => Ok(Confidence::Exploring),
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            "very_high" => Ok(Confidence::VeryHigh),
            "almost_certain" => Ok(Confidence::AlmostCertain),
            "certain" => Ok(Confidence::Certain),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_is_ordered() {
        assert!(Confidence::Exploring < Confidence::Low);
        assert!(Confidence::AlmostCertain < Confidence::Certain);
    }

    #[test]
    fn only_certain_is_certain() {
        assert!(Confidence::Certain.is_certain());
        assert!(!Confidence::AlmostCertain.is_certain());
        assert!(!Confidence::Exploring.is_certain());
    }

    #[test]
    fn round_trip() {
        for level in [
            Confidence::Exploring,
            Confidence::Low,
            Confidence::Medium,
            Confidence::High,
            Confidence::VeryHigh,
            Confidence::AlmostCertain,
            Confidence::Certain,
        ] {
            assert_eq!(level.as_str().parse::<Confidence>().ok(), Some(level));
        }
    }
}
