//! Workflow phase machine.
//!
//! A workflow tool drives a multi-phase investigation: plan on step 1,
//! investigate through the middle steps, validate at the end unless the
//! client asserts certainty. Phase is a pure function of the incoming step;
//! `next_step_required` alone controls termination; confidence only decides
//! whether the terminal step gets expert validation.

use crate::request::{Confidence, WorkflowRequest};
use serde::{Deserialize, Serialize};

/// Phase of a workflow investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Step 1: announce intent, file references only.
    Planning,
    /// Steps 2..N-1: gather evidence, embed new file bodies.
    Investigating,
    /// Final step with confidence below certain: expert review.
    Validating,
    /// Final step with asserted certainty: no expert call.
    Terminal,
}

impl WorkflowPhase {
    /// Classify the phase for an incoming step.
    pub fn classify(step_number: u32, next_step_required: bool, confidence: Confidence) -> Self {
        if !next_step_required {
            if confidence.is_certain() {
                WorkflowPhase::Terminal
            } else {
                WorkflowPhase::Validating
            }
        } else if step_number <= 1 {
            WorkflowPhase::Planning
        } else {
            WorkflowPhase::Investigating
        }
    }

    /// Classify the phase of a bound workflow request.
    pub fn for_request(request: &WorkflowRequest) -> Self {
        Self::classify(
            request.step_number,
            request.next_step_required,
            request.confidence,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Planning => "planning",
            WorkflowPhase::Investigating => "investigating",
            WorkflowPhase::Validating => "validating",
            WorkflowPhase::Terminal => "terminal",
        }
    }

    /// Whether this phase ends the investigation.
    pub fn is_final(&self) -> bool {
        matches!(self, WorkflowPhase::Validating | WorkflowPhase::Terminal)
    }

    /// Whether the terminal step should consult an expert model.
    pub fn consults_expert(&self) -> bool {
        matches!(self, WorkflowPhase::Validating)
    }

    /// File-embedding policy for this phase.
    pub fn embedding_policy(&self) -> EmbeddingPolicy {
        match self {
            WorkflowPhase::Planning => EmbeddingPolicy::ReferencesOnly,
            WorkflowPhase::Investigating => EmbeddingPolicy::NewBodies,
            WorkflowPhase::Validating | WorkflowPhase::Terminal => EmbeddingPolicy::AllBodies,
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How file context is embedded for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingPolicy {
    /// Path, size, and language hint only, never bodies.
    ReferencesOnly,
    /// Full bodies of relevant files not yet embedded in prior turns.
    NewBodies,
    /// Full bodies of all currently-relevant files.
    AllBodies,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_one_plans() {
        assert_eq!(
            WorkflowPhase::classify(1, true, Confidence::Exploring),
            WorkflowPhase::Planning
        );
    }

    #[test]
    fn middle_steps_investigate() {
        assert_eq!(
            WorkflowPhase::classify(2, true, Confidence::Low),
            WorkflowPhase::Investigating
        );
        assert_eq!(
            WorkflowPhase::classify(7, true, Confidence::High),
            WorkflowPhase::Investigating
        );
    }

    #[test]
    fn terminal_step_validates_below_certain() {
        assert_eq!(
            WorkflowPhase::classify(3, false, Confidence::VeryHigh),
            WorkflowPhase::Validating
        );
        assert_eq!(
            WorkflowPhase::classify(3, false, Confidence::AlmostCertain),
            WorkflowPhase::Validating
        );
    }

    #[test]
    fn certainty_skips_validation() {
        assert_eq!(
            WorkflowPhase::classify(3, false, Confidence::Certain),
            WorkflowPhase::Terminal
        );
    }

    #[test]
    fn confidence_alone_never_terminates() {
        // Certain confidence on a non-final step stays in the investigation.
        assert_eq!(
            WorkflowPhase::classify(2, true, Confidence::Certain),
            WorkflowPhase::Investigating
        );
    }

    #[test]
    fn embedding_policy_per_phase() {
        assert_eq!(
            WorkflowPhase::Planning.embedding_policy(),
            EmbeddingPolicy::ReferencesOnly
        );
        assert_eq!(
            WorkflowPhase::Investigating.embedding_policy(),
            EmbeddingPolicy::NewBodies
        );
        assert_eq!(
            WorkflowPhase::Validating.embedding_policy(),
            EmbeddingPolicy::AllBodies
        );
    }

    #[test]
    fn expert_consultation_only_in_validating() {
        assert!(WorkflowPhase::Validating.consults_expert());
        assert!(!WorkflowPhase::Terminal.consults_expert());
        assert!(!WorkflowPhase::Planning.consults_expert());
        assert!(WorkflowPhase::Terminal.is_final());
        assert!(WorkflowPhase::Validating.is_final());
    }
}
