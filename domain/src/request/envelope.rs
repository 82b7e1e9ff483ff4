//! Validated, typed tool inputs.
//!
//! The dispatcher binds raw JSON arguments into one of these envelopes before
//! a tool runs. Unknown fields are ignored for forward compatibility; typed
//! fields with the wrong type fail at deserialization with a field-level
//! diagnostic, and the cross-field checks here run afterwards.

use crate::conversation::ThreadId;
use crate::core::error::OrchestratorError;
use crate::request::confidence::Confidence;
use crate::request::thinking::ThinkingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which envelope shape a tool consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Simple,
    Workflow,
}

/// A bound envelope, tagged by tool variant.
#[derive(Debug, Clone)]
pub enum Envelope {
    Simple(ToolRequest),
    Workflow(WorkflowRequest),
}

impl Envelope {
    pub fn base(&self) -> &ToolRequest {
        match self {
            Envelope::Simple(request) => request,
            Envelope::Workflow(request) => &request.base,
        }
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        match self {
            Envelope::Simple(request) => request.validate(),
            Envelope::Workflow(request) => request.validate(),
        }
    }
}

/// Base request fields shared by every tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub prompt: String,
    /// Model name, alias, or "auto" for category-based selection.
    pub model: String,
    #[serde(default)]
    pub absolute_file_paths: Vec<PathBuf>,
    #[serde(default)]
    pub images: Vec<PathBuf>,
    /// Thread id from a prior response; raw here, parsed by `continuation()`.
    #[serde(default)]
    pub continuation_id: Option<String>,
    pub working_directory_absolute_path: PathBuf,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub thinking_mode: Option<ThinkingMode>,
}

impl ToolRequest {
    /// Field-level validation per the envelope contract.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.model.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "model must not be empty; use \"auto\" for automatic selection".to_string(),
            ));
        }
        require_absolute(
            &self.working_directory_absolute_path,
            "working_directory_absolute_path",
        )?;
        for path in &self.absolute_file_paths {
            require_absolute(path, "absolute_file_paths")?;
        }
        for path in &self.images {
            require_absolute(path, "images")?;
        }
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(OrchestratorError::Validation(format!(
                "temperature {} outside the allowed range [0.0, 2.0]",
                temperature
            )));
        }
        // Parse eagerly so a malformed id fails at binding, not at lookup.
        let _ = self.continuation()?;
        Ok(())
    }

    /// Parsed continuation id, if one was supplied.
    pub fn continuation(&self) -> Result<Option<ThreadId>, OrchestratorError> {
        match &self.continuation_id {
            Some(raw) => ThreadId::parse(raw).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the client asked for auto-mode selection.
    pub fn wants_auto_model(&self) -> bool {
        self.model.eq_ignore_ascii_case("auto")
    }
}

/// Workflow extension carried by step-machine tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    #[serde(flatten)]
    pub base: ToolRequest,
    /// Narrative for the current step.
    pub step: String,
    pub step_number: u32,
    pub total_steps: u32,
    pub next_step_required: bool,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub hypothesis: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub files_checked: Vec<PathBuf>,
    #[serde(default)]
    pub relevant_files: Vec<PathBuf>,
}

impl WorkflowRequest {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        self.base.validate()?;
        if self.step_number < 1 {
            return Err(OrchestratorError::Validation(
                "step_number must be at least 1".to_string(),
            ));
        }
        if self.total_steps < 1 {
            return Err(OrchestratorError::Validation(
                "total_steps must be at least 1".to_string(),
            ));
        }
        if self.step_number > self.total_steps {
            return Err(OrchestratorError::Validation(format!(
                "step_number ({}) exceeds total_steps ({})",
                self.step_number, self.total_steps
            )));
        }
        for path in self.files_checked.iter().chain(&self.relevant_files) {
            require_absolute(path, "relevant_files")?;
        }
        Ok(())
    }

    /// Whether this is the terminal step of the investigation.
    pub fn is_terminal(&self) -> bool {
        !self.next_step_required
    }
}

fn require_absolute(path: &Path, field: &str) -> Result<(), OrchestratorError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(OrchestratorError::Validation(format!(
            "{}: path '{}' must be absolute",
            field,
            path.display()
        )))
    }
}
