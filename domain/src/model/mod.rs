//! Model descriptors, categories, and provider wire types.

pub mod capability;
pub mod category;
pub mod completion;

pub use capability::{ModelCapabilities, ProviderKind};
pub use category::ToolCategory;
pub use completion::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, MessageRole, TokenUsage,
};
