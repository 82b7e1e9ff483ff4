//! Workflow step-machine domain logic.

pub mod phase;

pub use phase::{EmbeddingPolicy, WorkflowPhase};
