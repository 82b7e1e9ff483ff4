//! Error taxonomy shared across all layers.
//!
//! Every failure surfaced to a client maps onto exactly one
//! [`OrchestratorError`] variant. The `kind()` string is the stable wire
//! identifier; the display form is the human-readable message.

use crate::conversation::ThreadId;
use crate::model::ToolCategory;
use thiserror::Error;

/// Errors surfaced by the orchestration core.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Envelope field invalid (bad path, bad UUID, step invariants).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The dispatcher has no tool registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// No provider recognizes this model name or alias.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The restriction policy blocks this model.
    #[error("model '{0}' is blocked by the restriction policy")]
    ModelRestricted(String),

    /// Auto-mode found no candidate for the requested category.
    #[error("no eligible model for category '{0}'")]
    NoEligibleModel(ToolCategory),

    /// The model lacks a capability the request requires.
    #[error("model '{model}' does not support {feature}")]
    FeatureUnsupported { model: String, feature: String },

    /// The continuation id has valid syntax but no live thread.
    #[error("conversation thread not found: {0}")]
    ThreadNotFound(ThreadId),

    /// The thread is at its turn cap; the client must start a new thread.
    #[error("conversation thread {0} has reached its turn limit")]
    ThreadCapacityExceeded(ThreadId),

    /// Provider transport or HTTP failure.
    #[error("upstream provider error: {message}")]
    Upstream { message: String, retryable: bool },

    /// The caller cancelled the invocation.
    #[error("request cancelled")]
    Cancelled,

    /// Unexpected failure; the correlation id ties the response to the logs.
    #[error("internal error (correlation {correlation_id}): {message}")]
    Internal {
        correlation_id: String,
        message: String,
    },
}

impl OrchestratorError {
    /// Stable wire identifier for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "validation_error",
            OrchestratorError::UnknownTool(_) => "unknown_tool",
            OrchestratorError::UnknownModel(_) => "unknown_model",
            OrchestratorError::ModelRestricted(_) => "model_restricted",
            OrchestratorError::NoEligibleModel(_) => "no_eligible_model",
            OrchestratorError::FeatureUnsupported { .. } => "feature_unsupported",
            OrchestratorError::ThreadNotFound(_) => "thread_not_found",
            OrchestratorError::ThreadCapacityExceeded(_) => "thread_capacity_exceeded",
            OrchestratorError::Upstream { .. } => "upstream_error",
            OrchestratorError::Cancelled => "cancelled",
            OrchestratorError::Internal { .. } => "internal_error",
        }
    }

    /// Whether a retry of the same request could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrchestratorError::Upstream { retryable: true, .. })
    }
}
