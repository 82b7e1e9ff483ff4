//! Request envelopes and their value objects.

pub mod confidence;
pub mod envelope;
pub mod thinking;

pub use confidence::Confidence;
pub use envelope::{Envelope, EnvelopeKind, ToolRequest, WorkflowRequest};
pub use thinking::ThinkingMode;
