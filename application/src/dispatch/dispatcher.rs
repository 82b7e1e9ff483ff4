//! Tool dispatch: lookup, envelope binding, timeout, error serialization.
//!
//! The dispatcher is the single entry point for external tool calls. It
//! never returns an `Err`: every failure is serialized into the shared
//! response shape so the transport layer stays dumb.

use crate::tools::{Tool, ToolResponse};
use conclave_domain::{Envelope, EnvelopeKind, OrchestratorError, ToolCategory, ToolRequest, WorkflowRequest};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Extra wall-clock slack the dispatcher grants beyond the category timeout
/// already enforced around the provider call.
const OUTER_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

/// Catalog entry for `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
}

/// Routes external `{tool, arguments}` calls to registered tools.
pub struct Dispatcher {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Dispatcher {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut map = HashMap::new();
        for tool in tools {
            if map.insert(tool.name().to_string(), tool).is_some() {
                warn!("duplicate tool registration overwritten");
            }
        }
        Self { tools: map }
    }

    /// Names and categories of every registered tool, sorted by name.
    pub fn tool_infos(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.profile().description.to_string(),
                category: tool.category(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Execute one tool call, serializing every failure into the response.
    pub async fn dispatch(&self, tool_name: &str, arguments: serde_json::Value) -> ToolResponse {
        match self.try_dispatch(tool_name, arguments).await {
            Ok(response) => response,
            Err(error) => {
                info!("tool '{}' failed: {}", tool_name, error);
                ToolResponse::from_error(&error)
            }
        }
    }

    async fn try_dispatch(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResponse, OrchestratorError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| OrchestratorError::UnknownTool(tool_name.to_string()))?;

        let envelope = bind_envelope(tool.envelope_kind(), arguments)?;
        envelope.validate()?;

        // The engines enforce the per-call provider timeout; this outer
        // timeout is a safety net around the whole execution.
        let outer = tool.category().default_timeout() + OUTER_TIMEOUT_SLACK;
        let task = {
            let tool = Arc::clone(tool);
            tokio::spawn(async move { tool.execute(envelope).await })
        };

        match tokio::time::timeout(outer, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let correlation_id = Uuid::new_v4().to_string();
                error!(
                    correlation_id = %correlation_id,
                    "tool '{}' aborted unexpectedly: {}", tool_name, join_error
                );
                Err(OrchestratorError::Internal {
                    correlation_id,
                    message: format!("tool '{}' aborted unexpectedly", tool_name),
                })
            }
            Err(_) => Err(OrchestratorError::Upstream {
                message: format!(
                    "tool '{}' exceeded the dispatcher timeout of {}s",
                    tool_name,
                    outer.as_secs()
                ),
                retryable: true,
            }),
        }
    }
}

/// Bind raw JSON arguments into the tool's declared envelope shape.
///
/// Serde reports the offending field in its message, which becomes the
/// field-level diagnostic required by the envelope contract.
fn bind_envelope(
    kind: EnvelopeKind,
    arguments: serde_json::Value,
) -> Result<Envelope, OrchestratorError> {
    match kind {
        EnvelopeKind::Simple => serde_json::from_value::<ToolRequest>(arguments)
            .map(Envelope::Simple)
            .map_err(|e| OrchestratorError::Validation(format!("invalid arguments: {}", e))),
        EnvelopeKind::Workflow => serde_json::from_value::<WorkflowRequest>(arguments)
            .map(Envelope::Workflow)
            .map_err(|e| OrchestratorError::Validation(format!("invalid arguments: {}", e))),
    }
}
