//! Workflow tool execution: the step machine.
//!
//! Each call advances a multi-phase investigation one step. The phase is a
//! pure function of the incoming step (see
//! [`WorkflowPhase`](conclave_domain::WorkflowPhase)); this engine applies
//! the per-phase file-embedding policy, drives the per-step provider call,
//! and consults an expert model at the terminal step unless the client has
//! asserted certainty. Expert failures degrade: the primary synthesis is
//! still returned, with the expert error recorded in metadata.

use super::response::{ResponseMetadata, ToolResponse};
use super::shared::{
    apply_sampling, generate_with_limits, hydrate_thread, render_file_bodies,
    render_file_references, resolve_model,
};
use super::{DEFAULT_HISTORY_BUDGET, ToolContext, ToolProfile, check_cancelled};
use crate::ports::exchange_logger::ExchangeEvent;
use crate::registry::Resolution;
use conclave_domain::{
    ChatMessage, CompletionRequest, EmbeddingPolicy, OrchestratorError, ToolCategory, Turn,
    WorkflowPhase, WorkflowRequest, effective_budget,
};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct WorkflowEngine {
    context: ToolContext,
}

impl WorkflowEngine {
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    pub async fn run(
        &self,
        profile: &ToolProfile,
        request: WorkflowRequest,
    ) -> Result<ToolResponse, OrchestratorError> {
        check_cancelled(&self.context.cancel)?;

        let phase = WorkflowPhase::for_request(&request);
        debug!(
            "{}: step {}/{} phase {}",
            profile.name, request.step_number, request.total_steps, phase
        );

        let mut warnings = Vec::new();
        let resolution = resolve_model(&self.context.registry, &request.base, profile.category)?;

        let thread = hydrate_thread(
            &self.context.store,
            request.base.continuation()?,
            &mut warnings,
        );

        let budget = effective_budget(DEFAULT_HISTORY_BUDGET, &resolution.capabilities);
        let history = thread
            .as_ref()
            .map(|t| self.context.history_builder().build_from_thread(t, budget))
            .unwrap_or_default();
        let remaining_budget = budget.saturating_sub(history.tokens_used);

        let step_context = self.compose_step(&request, phase, thread.as_ref(), remaining_budget);

        let mut messages: Vec<ChatMessage> = history.messages.clone();
        messages.push(ChatMessage::user(step_context.clone()));

        let completion = CompletionRequest::new(resolution.canonical(), messages.clone())
            .with_system_prompt(profile.system_prompt)
            .with_images(request.base.images.clone());
        let completion = apply_sampling(
            completion,
            &request.base,
            &resolution.capabilities,
            &mut warnings,
        );

        // Intermediate-step provider errors propagate here with no turns
        // appended, so the caller can retry with an adjusted step.
        let response = generate_with_limits(
            &resolution,
            completion,
            profile.category.default_timeout(),
            &self.context.cancel,
        )
        .await?;

        // Terminal step: optional expert validation, degrading on failure.
        let mut expert: Option<(String, String)> = None;
        let mut expert_error: Option<String> = None;
        if phase.consults_expert() {
            match self
                .consult_expert(profile, &messages, &response.content)
                .await
            {
                Ok(outcome) => expert = Some(outcome),
                Err(error) => {
                    warn!("{}: expert validation failed: {}", profile.name, error);
                    warnings
                        .push("expert validation failed; returning primary synthesis".to_string());
                    expert_error = Some(error.to_string());
                }
            }
        }

        let thread_id = match thread {
            Some(ref existing) => existing.id,
            None => self
                .context
                .store
                .create_thread(profile.name, &request.step, None),
        };
        self.context.store.append_turn(
            &thread_id,
            Turn::user(profile.name, step_context.clone()).with_files(request.relevant_files.clone()),
        )?;
        self.context.store.append_turn(
            &thread_id,
            Turn::assistant(profile.name, response.content.clone())
                .with_model(response.model_name.clone()),
        )?;
        if let Some((ref content, ref model)) = expert {
            self.context.store.append_turn(
                &thread_id,
                Turn::assistant(profile.name, content.clone()).with_model(model.clone()),
            )?;
        }

        self.context.logger.log(ExchangeEvent::new(
            "workflow_step",
            json!({
                "tool": profile.name,
                "phase": phase.as_str(),
                "step": request.step_number,
                "total_steps": request.total_steps,
                "confidence": request.confidence.as_str(),
                "model": response.model_name,
                "expert_consulted": expert.is_some(),
                "thread": thread_id.to_string(),
            }),
        ));

        let mut content = response.content.clone();
        if let Some((ref expert_content, ref expert_model)) = expert {
            content.push_str(&format!(
                "\n\n## Expert Validation ({})\n{}",
                expert_model, expert_content
            ));
        }

        let metadata = ResponseMetadata {
            model_used: Some(response.model_name.clone()),
            provider: Some(response.provider),
            tokens: Some(response.usage),
            step_number: Some(request.step_number),
            total_steps: Some(request.total_steps),
            confidence: Some(request.confidence),
            phase: Some(phase),
            expert_consulted: phase.is_final().then_some(expert.is_some()),
            expert_error,
            warnings,
        };
        Ok(ToolResponse::success(content, thread_id).with_metadata(metadata))
    }

    /// Render the step narrative plus phase-appropriate file context.
    fn compose_step(
        &self,
        request: &WorkflowRequest,
        phase: WorkflowPhase,
        thread: Option<&conclave_domain::ConversationThread>,
        budget: u32,
    ) -> String {
        let mut text = format!(
            "## Step {} of {}{}\n\n{}",
            request.step_number,
            request.total_steps,
            if request.is_terminal() { " (final)" } else { "" },
            request.step
        );
        if !request.findings.is_empty() {
            text.push_str(&format!("\n\n## Findings\n{}", request.findings));
        }
        if let Some(ref hypothesis) = request.hypothesis {
            text.push_str(&format!("\n\n## Hypothesis\n{}", hypothesis));
        }

        let interesting: Vec<PathBuf> = request
            .relevant_files
            .iter()
            .chain(&request.base.absolute_file_paths)
            .cloned()
            .collect();

        match phase.embedding_policy() {
            EmbeddingPolicy::ReferencesOnly => {
                if !interesting.is_empty() {
                    let block =
                        render_file_references(self.context.files.as_ref(), &interesting);
                    text.push_str(&format!("\n\n## Files of interest (references)\n{}", block));
                }
            }
            EmbeddingPolicy::NewBodies => {
                let already: HashSet<&PathBuf> = thread
                    .map(|t| t.turns.iter().flat_map(|turn| &turn.files).collect())
                    .unwrap_or_default();
                let fresh: Vec<PathBuf> = request
                    .relevant_files
                    .iter()
                    .filter(|p| !already.contains(p))
                    .cloned()
                    .collect();
                if !fresh.is_empty() {
                    let (block, _, _) =
                        render_file_bodies(self.context.files.as_ref(), &fresh, budget);
                    if !block.is_empty() {
                        text.push_str(&format!("\n\n## Newly relevant files\n{}", block));
                    }
                }
            }
            EmbeddingPolicy::AllBodies => {
                if !request.relevant_files.is_empty() {
                    let (block, _, _) = render_file_bodies(
                        self.context.files.as_ref(),
                        &request.relevant_files,
                        budget,
                    );
                    if !block.is_empty() {
                        text.push_str(&format!("\n\n## Relevant files\n{}", block));
                    }
                }
            }
        }
        text
    }

    /// Ask a harder-reasoning model to approve, challenge, or extend the
    /// findings, given the full investigation trace.
    async fn consult_expert(
        &self,
        profile: &ToolProfile,
        trace: &[ChatMessage],
        primary: &str,
    ) -> Result<(String, String), OrchestratorError> {
        let resolution = self.expert_resolution()?;

        let mut prompt = String::from(
            "Review this investigation. Approve, challenge, or extend the findings.\n\n",
        );
        for message in trace {
            prompt.push_str(&format!("[{:?}] {}\n", message.role, message.content));
        }
        prompt.push_str(&format!("\n## Proposed synthesis\n{}", primary));

        let completion =
            CompletionRequest::new(resolution.canonical(), vec![ChatMessage::user(prompt)])
                .with_system_prompt(profile.system_prompt);

        let response = generate_with_limits(
            &resolution,
            completion,
            ToolCategory::Reasoning.default_timeout(),
            &self.context.cancel,
        )
        .await?;
        Ok((response.content, response.model_name))
    }

    fn expert_resolution(&self) -> Result<Resolution, OrchestratorError> {
        match &self.context.expert_model {
            Some(name) => self.context.registry.resolve(name),
            None => self.context.registry.select_auto(ToolCategory::Reasoning),
        }
    }
}
