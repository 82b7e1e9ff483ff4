//! Tool contracts and execution engines.
//!
//! A tool is a named analysis operation with a category and an envelope
//! shape. The shared behavior (model selection, history hydration, turn
//! recording, workflow stepping) lives in the two engines; individual tools
//! contribute only their profile (name, category, system prompt).

pub mod catalog;
pub mod response;
pub mod shared;
pub mod simple;
pub mod workflow;

pub use response::{ErrorBody, ResponseMetadata, ToolResponse};
pub use simple::SimpleToolEngine;
pub use workflow::WorkflowEngine;

use crate::memory::{ConversationStore, HistoryBuilder};
use crate::ports::exchange_logger::ExchangeLogger;
use crate::ports::file_reader::FileReader;
use crate::registry::ProviderRegistry;
use async_trait::async_trait;
use conclave_domain::{Envelope, EnvelopeKind, OrchestratorError, ToolCategory};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default history budget requested before per-model clamping.
pub const DEFAULT_HISTORY_BUDGET: u32 = 64_000;

/// Static identity of a tool: everything but the execution logic.
#[derive(Debug, Clone, Copy)]
pub struct ToolProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ToolCategory,
    /// One-line system prompt; the full prompt text is supplied externally.
    pub system_prompt: &'static str,
}

/// A named analysis operation invoked by the dispatcher.
#[async_trait]
pub trait Tool: Send + Sync {
    fn profile(&self) -> &ToolProfile;

    /// Which envelope shape `execute` expects.
    fn envelope_kind(&self) -> EnvelopeKind;

    async fn execute(&self, envelope: Envelope) -> Result<ToolResponse, OrchestratorError>;

    fn name(&self) -> &'static str {
        self.profile().name
    }

    fn category(&self) -> ToolCategory {
        self.profile().category
    }
}

/// Shared dependencies threaded through tool execution.
///
/// Constructed once at startup and cloned per engine; everything inside is
/// reference-counted.
#[derive(Clone)]
pub struct ToolContext {
    pub registry: Arc<ProviderRegistry>,
    pub store: Arc<ConversationStore>,
    pub files: Arc<dyn FileReader>,
    pub logger: Arc<dyn ExchangeLogger>,
    pub cancel: CancellationToken,
    /// Configured expert-validation model; `None` selects by category.
    pub expert_model: Option<String>,
}

impl ToolContext {
    pub fn history_builder(&self) -> HistoryBuilder {
        HistoryBuilder::new(Arc::clone(&self.store), Arc::clone(&self.files))
    }
}

/// Return `Cancelled` when the caller has given up.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), OrchestratorError> {
    if token.is_cancelled() {
        Err(OrchestratorError::Cancelled)
    } else {
        Ok(())
    }
}
