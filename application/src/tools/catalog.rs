//! Built-in tool catalog.
//!
//! Tools here are thin: a profile plus a delegation to the shared engine.
//! The full prompt text for each tool is supplied externally; the one-line
//! system prompts below only anchor the tool's register.

use super::simple::SimpleToolEngine;
use super::workflow::WorkflowEngine;
use super::{Tool, ToolContext, ToolProfile, ToolResponse};
use async_trait::async_trait;
use conclave_domain::{Envelope, EnvelopeKind, OrchestratorError, ToolCategory};
use std::sync::Arc;

/// Construct the built-in tool set over shared engines.
pub fn builtin_tools(context: ToolContext) -> Vec<Arc<dyn Tool>> {
    let simple = Arc::new(SimpleToolEngine::new(context.clone()));
    let workflow = Arc::new(WorkflowEngine::new(context.clone()));

    vec![
        Arc::new(SimpleTool {
            profile: CHAT,
            engine: Arc::clone(&simple),
        }),
        Arc::new(ListModelsTool { context }),
        Arc::new(WorkflowTool {
            profile: DEBUG,
            engine: Arc::clone(&workflow),
        }),
        Arc::new(WorkflowTool {
            profile: CODEREVIEW,
            engine: Arc::clone(&workflow),
        }),
        Arc::new(WorkflowTool {
            profile: PLANNER,
            engine: workflow,
        }),
    ]
}

const CHAT: ToolProfile = ToolProfile {
    name: "chat",
    description: "Open-ended collaboration and brainstorming with a model",
    category: ToolCategory::General,
    system_prompt: "You are a senior engineering thought partner; be direct and concrete.",
};

const DEBUG: ToolProfile = ToolProfile {
    name: "debug",
    description: "Step-wise root-cause investigation of a defect",
    category: ToolCategory::Reasoning,
    system_prompt: "You are a systematic debugger; reason from evidence, not guesses.",
};

const CODEREVIEW: ToolProfile = ToolProfile {
    name: "codereview",
    description: "Staged review of code for defects and design issues",
    category: ToolCategory::Coding,
    system_prompt: "You are a meticulous code reviewer; cite file and line for every finding.",
};

const PLANNER: ToolProfile = ToolProfile {
    name: "planner",
    description: "Interactive sequential planning for complex changes",
    category: ToolCategory::Reasoning,
    system_prompt: "You are a planning specialist; produce ordered, verifiable steps.",
};

/// A single-shot tool backed by the simple engine.
struct SimpleTool {
    profile: ToolProfile,
    engine: Arc<SimpleToolEngine>,
}

#[async_trait]
impl Tool for SimpleTool {
    fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    fn envelope_kind(&self) -> EnvelopeKind {
        EnvelopeKind::Simple
    }

    async fn execute(&self, envelope: Envelope) -> Result<ToolResponse, OrchestratorError> {
        match envelope {
            Envelope::Simple(request) => self.engine.run(&self.profile, request).await,
            Envelope::Workflow(_) => Err(OrchestratorError::Validation(format!(
                "tool '{}' takes a simple envelope",
                self.profile.name
            ))),
        }
    }
}

/// A step-machine tool backed by the workflow engine.
struct WorkflowTool {
    profile: ToolProfile,
    engine: Arc<WorkflowEngine>,
}

#[async_trait]
impl Tool for WorkflowTool {
    fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    fn envelope_kind(&self) -> EnvelopeKind {
        EnvelopeKind::Workflow
    }

    async fn execute(&self, envelope: Envelope) -> Result<ToolResponse, OrchestratorError> {
        match envelope {
            Envelope::Workflow(request) => self.engine.run(&self.profile, request).await,
            Envelope::Simple(_) => Err(OrchestratorError::Validation(format!(
                "tool '{}' takes a workflow envelope",
                self.profile.name
            ))),
        }
    }
}

/// Catalog dump without a provider call.
struct ListModelsTool {
    context: ToolContext,
}

const LISTMODELS: ToolProfile = ToolProfile {
    name: "listmodels",
    description: "List configured providers, their models, and aliases",
    category: ToolCategory::Fast,
    system_prompt: "",
};

#[async_trait]
impl Tool for ListModelsTool {
    fn profile(&self) -> &ToolProfile {
        &LISTMODELS
    }

    fn envelope_kind(&self) -> EnvelopeKind {
        EnvelopeKind::Simple
    }

    async fn execute(&self, _envelope: Envelope) -> Result<ToolResponse, OrchestratorError> {
        let mut out = String::from("# Available models\n");
        for provider in self.context.registry.catalog() {
            out.push_str(&format!("\n## {}\n", provider.friendly_name));
            for model in &provider.models {
                let aliases = if model.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" (aliases: {})", model.aliases.join(", "))
                };
                out.push_str(&format!(
                    "- {}{} (context {}, score {})\n",
                    model.name, aliases, model.context_window, model.intelligence_score
                ));
            }
        }
        Ok(ToolResponse::success_stateless(out))
    }
}
