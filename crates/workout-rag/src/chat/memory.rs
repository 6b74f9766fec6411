//! Per-session rolling conversation history

use dashmap::DashMap;
use std::collections::VecDeque;

use crate::types::Turn;

/// Bounded history buffers keyed by session id.
///
/// Each session owns its own buffer, so concurrent sessions never see each
/// other's exchanges. The oldest turn is evicted once `max_turns` is reached.
#[derive(Debug)]
pub struct ConversationMemory {
    sessions: DashMap<String, VecDeque<Turn>>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Snapshot of a session's turns, oldest first
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record(&self, session_id: &str, question: impl Into<String>, answer: impl Into<String>) {
        let mut turns = self.sessions.entry(session_id.to_string()).or_default();
        if turns.len() == self.max_turns {
            turns.pop_front();
        }
        turns.push_back(Turn::new(question, answer));
    }

    /// Forget a session; returns whether it existed
    pub fn reset(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
