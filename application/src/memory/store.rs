//! In-process conversation store.
//!
//! A process-global map `ThreadId → ConversationThread`. The store-wide lock
//! is held only for map mutation: every operation here is non-suspending,
//! and the lock is never held across a provider call. Expired threads are
//! swept opportunistically on every access.

use chrono::{DateTime, Utc};
use conclave_domain::{ConversationThread, OrchestratorError, ThreadId, Turn};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Thread-keyed in-memory conversation store.
pub struct ConversationStore {
    threads: Mutex<HashMap<ThreadId, ConversationThread>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fresh thread and return its id.
    pub fn create_thread(
        &self,
        tool_name: &str,
        initial_prompt: &str,
        parent: Option<ThreadId>,
    ) -> ThreadId {
        let mut thread = ConversationThread::new(tool_name, initial_prompt);
        if let Some(parent_id) = parent {
            thread = thread.with_parent(parent_id);
        }
        let id = thread.id;

        let mut threads = self.threads.lock().expect("store lock poisoned");
        Self::sweep_locked(&mut threads, Utc::now());
        threads.insert(id, thread);
        id
    }

    /// Fetch a snapshot of a thread, touching its access time.
    ///
    /// Returns `None` for unknown or expired ids. Callers pass a parsed
    /// [`ThreadId`], so UUID validation has already happened.
    pub fn get_thread(&self, id: &ThreadId) -> Option<ConversationThread> {
        let now = Utc::now();
        let mut threads = self.threads.lock().expect("store lock poisoned");
        Self::sweep_locked(&mut threads, now);
        let thread = threads.get_mut(id)?;
        thread.touch(now);
        Some(thread.clone())
    }

    /// Append a turn to an existing thread.
    ///
    /// Fails with `ThreadNotFound` for unknown ids and
    /// `ThreadCapacityExceeded` at the turn cap; in both cases the store is
    /// unchanged.
    pub fn append_turn(&self, id: &ThreadId, turn: Turn) -> Result<(), OrchestratorError> {
        let now = Utc::now();
        let mut threads = self.threads.lock().expect("store lock poisoned");
        Self::sweep_locked(&mut threads, now);
        let thread = threads
            .get_mut(id)
            .ok_or(OrchestratorError::ThreadNotFound(*id))?;
        thread.push_turn(turn)?;
        thread.touch(now);
        Ok(())
    }

    /// Remove threads idle past the TTL; returns how many were dropped.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut threads = self.threads.lock().expect("store lock poisoned");
        Self::sweep_locked(&mut threads, now)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.lock().expect("store lock poisoned").len()
    }

    fn sweep_locked(
        threads: &mut HashMap<ThreadId, ConversationThread>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = threads.len();
        threads.retain(|_, thread| !thread.is_expired(now));
        let swept = before - threads.len();
        if swept > 0 {
            debug!("swept {} expired conversation thread(s)", swept);
        }
        swept
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
