//! Deterministic scripted backend for tests and development.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{AgentBackend, AgentTurn, CompletionRequest};

/// Backend that replays a fixed queue of turns.
///
/// Every completion pops the next scripted turn and logs the request for
/// later assertions. An exhausted queue returns an empty turn, which lets
/// loop-ceiling behavior play out in tests without scripting fifteen turns.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    turns: Mutex<VecDeque<AgentTurn>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail_next: Mutex<bool>,
}

impl ScriptedBackend {
    /// Creates a backend that replays the given turns in order.
    pub fn new(turns: impl IntoIterator<Item = AgentTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            fail_next: Mutex::new(false),
        }
    }

    /// Makes the next completion fail with a transport error.
    pub fn fail_next(&self) {
        *self.fail_next.lock().expect("scripted backend poisoned") = true;
    }

    /// Returns how many completions were requested.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("scripted backend poisoned").len()
    }

    /// Returns a copy of every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("scripted backend poisoned")
            .clone()
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<AgentTurn> {
        self.requests
            .lock()
            .map_err(|_| Error::Backend("scripted backend poisoned".to_string()))?
            .push(request);

        let mut fail = self
            .fail_next
            .lock()
            .map_err(|_| Error::Backend("scripted backend poisoned".to_string()))?;
        if *fail {
            *fail = false;
            return Err(Error::Backend("scripted transport failure".to_string()));
        }
        drop(fail);

        let turn = self
            .turns
            .lock()
            .map_err(|_| Error::Backend("scripted backend poisoned".to_string()))?
            .pop_front()
            .unwrap_or_default();
        Ok(turn)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replays_turns_in_order() {
        let backend = ScriptedBackend::new([AgentTurn::text("one"), AgentTurn::text("two")]);

        let first = backend.complete(request()).await.unwrap();
        let second = backend.complete(request()).await.unwrap();

        assert_eq!(first.text.as_deref(), Some("one"));
        assert_eq!(second.text.as_deref(), Some("two"));
        assert_eq!(backend.request_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_queue_returns_empty_turns() {
        let backend = ScriptedBackend::new([]);
        let turn = backend.complete(request()).await.unwrap();
        assert_eq!(turn, AgentTurn::default());
    }

    #[tokio::test]
    async fn fail_next_fails_exactly_once() {
        let backend = ScriptedBackend::new([AgentTurn::text("after")]);
        backend.fail_next();

        assert!(backend.complete(request()).await.is_err());
        let turn = backend.complete(request()).await.unwrap();
        assert_eq!(turn.text.as_deref(), Some("after"));
    }
}
