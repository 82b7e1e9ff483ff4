//! Conversation memory: the thread store and history reconstruction.

pub mod history;
pub mod store;

pub use history::{BuiltHistory, EmbeddedFile, HistoryBuilder};
pub use store::ConversationStore;
