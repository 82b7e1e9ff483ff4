//! The response shape shared by every tool.

use conclave_domain::{
    Confidence, OrchestratorError, ProviderKind, ThreadId, TokenUsage, WorkflowPhase,
};
use serde::Serialize;
use serde_json::json;

/// Structured error body surfaced to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Per-response metadata; absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<WorkflowPhase>,
    /// Whether the terminal step consulted an expert model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert_consulted: Option<bool>,
    /// Present when expert validation failed and the tool degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Response object returned by every tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_id: Option<ThreadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub metadata: ResponseMetadata,
}

impl ToolResponse {
    pub fn success(content: impl Into<String>, continuation_id: ThreadId) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            continuation_id: Some(continuation_id),
            error: None,
            metadata: ResponseMetadata::default(),
        }
    }

    /// A successful response with no conversation state (local tools).
    pub fn success_stateless(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            continuation_id: None,
            error: None,
            metadata: ResponseMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Serialize an error into the shared response shape.
    pub fn from_error(error: &OrchestratorError) -> Self {
        let details = match error {
            OrchestratorError::Upstream { retryable, .. } => {
                Some(json!({ "retryable": retryable }))
            }
            OrchestratorError::Internal { correlation_id, .. } => {
                Some(json!({ "correlation_id": correlation_id }))
            }
            _ => None,
        };
        Self {
            success: false,
            content: None,
            continuation_id: None,
            error: Some(ErrorBody {
                kind: error.kind().to_string(),
                message: error.to_string(),
                details,
            }),
            metadata: ResponseMetadata::default(),
        }
    }
}
