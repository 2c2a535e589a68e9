//! Conversation store interface.
//!
//! The relational store is an external collaborator; the engine only needs
//! two operations from it: reading recent turns to seed agent context and
//! writing the terminal record at completion. [`MemoryConversationStore`]
//! implements the contract in-process for tests and development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::outcome::TerminalRecord;

/// Author of a stored conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Assistant,
}

/// One prior conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTurn {
    /// Who authored the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl StoredTurn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Interface to the external relational store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns up to `limit` most recent turns for the project, oldest first.
    async fn recent_turns(&self, project_id: &str, limit: usize) -> Result<Vec<StoredTurn>>;

    /// Writes one terminal record for the project.
    ///
    /// The engine calls this from inside a durable step, so retried attempts
    /// never double-write.
    async fn write_terminal(&self, project_id: &str, record: &TerminalRecord) -> Result<()>;
}

/// In-process conversation store.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    turns: Mutex<HashMap<String, Vec<StoredTurn>>>,
    terminals: Mutex<HashMap<String, Vec<TerminalRecord>>>,
}

impl MemoryConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a prior turn for a project.
    pub fn push_turn(&self, project_id: &str, turn: StoredTurn) {
        self.turns
            .lock()
            .expect("conversation store poisoned")
            .entry(project_id.to_string())
            .or_default()
            .push(turn);
    }

    /// Returns every terminal record written for a project.
    pub fn terminals(&self, project_id: &str) -> Vec<TerminalRecord> {
        self.terminals
            .lock()
            .expect("conversation store poisoned")
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn recent_turns(&self, project_id: &str, limit: usize) -> Result<Vec<StoredTurn>> {
        let turns = self
            .turns
            .lock()
            .map_err(|_| Error::History("conversation store poisoned".to_string()))?;
        let all = turns.get(project_id).cloned().unwrap_or_default();

        // Most recent `limit` turns, kept in oldest-first order.
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn write_terminal(&self, project_id: &str, record: &TerminalRecord) -> Result<()> {
        self.terminals
            .lock()
            .map_err(|_| Error::History("conversation store poisoned".to_string()))?
            .entry(project_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recent_turns_keeps_the_newest_oldest_first() {
        let store = MemoryConversationStore::new();
        for i in 0..8 {
            store.push_turn("p", StoredTurn::user(format!("turn {}", i)));
        }

        let turns = store.recent_turns("p", 5).await.unwrap();

        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].content, "turn 3");
        assert_eq!(turns[4].content, "turn 7");
    }

    #[tokio::test]
    async fn recent_turns_for_unknown_project_is_empty() {
        let store = MemoryConversationStore::new();
        assert!(store.recent_turns("nope", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn terminal_records_accumulate_per_project() {
        let store = MemoryConversationStore::new();
        store
            .write_terminal("p", &TerminalRecord::failure())
            .await
            .unwrap();

        assert_eq!(store.terminals("p").len(), 1);
        assert!(store.terminals("other").is_empty());
    }
}
