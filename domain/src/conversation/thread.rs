//! Conversation thread and turn entities.
//!
//! A thread bridges the stateless request protocol with stateful multi-turn
//! workflows: each tool response carries the thread id back to the client as
//! a continuation id, and later calls replay the accumulated turns.

use crate::core::error::OrchestratorError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Hard cap on turns per thread; the 21st append is rejected.
pub const MAX_TURNS_PER_THREAD: usize = 20;

/// Threads idle longer than this are swept.
pub fn thread_ttl() -> Duration {
    Duration::hours(3)
}

/// UUID v4 identifier of a conversation thread.
///
/// Doubles as the continuation id on the wire; parsing validates UUID syntax
/// before any store lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(Uuid);

impl ThreadId {
    /// Allocate a fresh v4 id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a continuation id, rejecting anything that is not a UUID.
    pub fn parse(value: &str) -> Result<Self, OrchestratorError> {
        Uuid::parse_str(value).map(Self).map_err(|_| {
            OrchestratorError::Validation(format!("continuation_id is not a valid UUID: {}", value))
        })
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message within a thread, with its file and image references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Tool that produced or received this turn.
    pub tool_name: String,
    /// Model that answered; absent on user turns.
    pub model_name: Option<String>,
    /// Absolute paths referenced by this turn.
    pub files: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            tool_name: tool_name.into(),
            model_name: None,
            files: Vec::new(),
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            tool_name: tool_name.into(),
            model_name: None,
            files: Vec::new(),
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }
}

/// A conversation thread (Entity).
///
/// Created the first time a tool returns a continuation id, mutated by
/// appending turns, destroyed by the TTL sweep or process exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: ThreadId,
    /// Thread this one was forked from; a lookup key, never ownership.
    pub parent_id: Option<ThreadId>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// Tool that opened the thread.
    pub tool_name: String,
    /// Snapshot of the prompt that opened the thread.
    pub initial_prompt: String,
    pub turns: Vec<Turn>,
}

impl ConversationThread {
    pub fn new(tool_name: impl Into<String>, initial_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ThreadId::new(),
            parent_id: None,
            created_at: now,
            last_accessed_at: now,
            tool_name: tool_name.into(),
            initial_prompt: initial_prompt.into(),
            turns: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: ThreadId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Append a turn, enforcing the turn cap.
    ///
    /// On `Err` the thread is untouched: no truncation, no partial append.
    pub fn push_turn(&mut self, turn: Turn) -> Result<(), OrchestratorError> {
        if self.turns.len() >= MAX_TURNS_PER_THREAD {
            return Err(OrchestratorError::ThreadCapacityExceeded(self.id));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Record an access for TTL purposes.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.last_accessed_at + thread_ttl() < now
    }

    /// Remaining turn capacity.
    pub fn remaining_turns(&self) -> usize {
        MAX_TURNS_PER_THREAD - self.turns.len()
    }
}
