//! History reconstruction with file dedup and token budgeting.
//!
//! The history builder turns a stored thread back into provider-bound
//! messages. Two rules shape the output:
//!
//! - **Newest-first file dedup.** When a path appears in several turns, only
//!   the newest reference survives; the most recent reference reflects the
//!   user's latest edits. Historical versions are never reconciled.
//! - **Messages before files.** The token budget is spent on messages first,
//!   newest-first; whatever remains goes to file bodies, also newest-first.
//!   A message is kept whole or dropped, never truncated.

use super::store::ConversationStore;
use crate::ports::file_reader::FileReader;
use conclave_domain::{
    ChatMessage, ConversationThread, ThreadId, TurnRole, estimate_tokens,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// A file body included in the reconstructed history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Output of history reconstruction.
#[derive(Debug, Clone, Default)]
pub struct BuiltHistory {
    /// Prior turns in chronological order.
    pub messages: Vec<ChatMessage>,
    /// Deduplicated file bodies, chronological by their newest reference.
    pub embedded_files: Vec<EmbeddedFile>,
    /// Estimated tokens actually consumed by messages and files.
    pub tokens_used: u32,
}

impl BuiltHistory {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.embedded_files.is_empty()
    }
}

/// Reconstructs prompt history from stored threads under a token budget.
pub struct HistoryBuilder {
    store: Arc<ConversationStore>,
    files: Arc<dyn FileReader>,
}

impl HistoryBuilder {
    pub fn new(store: Arc<ConversationStore>, files: Arc<dyn FileReader>) -> Self {
        Self { store, files }
    }

    /// Build history for a thread. Unknown or expired threads yield an empty
    /// history; continuation recovery is the caller's concern, not an error
    /// here.
    pub fn build(&self, thread_id: &ThreadId, token_budget: u32) -> BuiltHistory {
        match self.store.get_thread(thread_id) {
            Some(thread) => self.build_from_thread(&thread, token_budget),
            None => BuiltHistory::default(),
        }
    }

    /// Build history from a thread snapshot.
    pub fn build_from_thread(
        &self,
        thread: &ConversationThread,
        token_budget: u32,
    ) -> BuiltHistory {
        let mut remaining = token_budget;

        // Messages first, walking newest-to-oldest; once one no longer fits,
        // everything older is dropped with it.
        let mut messages: Vec<ChatMessage> = Vec::new();
        for turn in thread.turns.iter().rev() {
            let message = match turn.role {
                TurnRole::User => ChatMessage::user(turn.content.clone()),
                TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
            };
            let cost = estimate_tokens(&message.content);
            if cost > remaining {
                debug!(
                    "history budget exhausted after {} message(s), dropping older turns",
                    messages.len()
                );
                break;
            }
            remaining -= cost;
            messages.push(message);
        }
        messages.reverse();

        // Files next: newest reference wins, oldest references evict first.
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut embedded: Vec<EmbeddedFile> = Vec::new();
        'turns: for turn in thread.turns.iter().rev() {
            for path in &turn.files {
                if !seen.insert(path.clone()) {
                    continue;
                }
                let content = match self.files.read(path) {
                    Ok(content) => content,
                    Err(error) => {
                        warn!("skipping unreadable file {}: {}", path.display(), error);
                        continue;
                    }
                };
                let cost = estimate_tokens(&content);
                if cost > remaining {
                    break 'turns;
                }
                remaining -= cost;
                embedded.push(EmbeddedFile {
                    path: path.clone(),
                    content,
                });
            }
        }
        embedded.reverse();

        BuiltHistory {
            messages,
            embedded_files: embedded,
            tokens_used: token_budget - remaining,
        }
    }
}
