//! Generative-backend interface.
//!
//! The reasoning backend is an external collaborator: the engine hands it a
//! system prompt, the transcript so far, and the tool schemas, and receives
//! back either plain text or tool-invocation requests. Any backend that
//! honors this contract plugs in; the tool contract itself is backend
//! agnostic.

mod scripted;

pub use scripted::ScriptedBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One message in the agent transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    /// A user-authored turn.
    User { content: String },
    /// An agent-authored text turn.
    Assistant { content: String },
    /// A tool invocation requested by the agent.
    ToolCall { tool: String, arguments: Value },
    /// The result string fed back for a tool invocation.
    ToolResult { tool: String, content: String },
}

/// A tool invocation requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name.
    pub tool: String,
    /// Raw, not-yet-validated arguments.
    pub arguments: Value,
}

/// Schema describing one tool to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for the arguments.
    pub parameters: Value,
}

/// What the agent produced in one turn.
///
/// A turn may carry text, tool calls, both, or neither; the engine feeds each
/// tool's result back before requesting the next turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTurn {
    /// Agent-authored text, if any.
    pub text: Option<String>,
    /// Requested tool invocations, in order.
    pub tool_calls: Vec<ToolCall>,
}

impl AgentTurn {
    /// Creates a text-only turn.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a tool-calls-only turn.
    pub fn tools(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    /// Returns the text if it is non-empty after trimming.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One completion request to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: String,
    /// Transcript so far.
    pub messages: Vec<ChatMessage>,
    /// Tools available this turn.
    pub tools: Vec<ToolSpec>,
}

/// Trait for generative reasoning backends.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Requests one agent turn.
    async fn complete(&self, request: CompletionRequest) -> Result<AgentTurn>;

    /// Returns the name of this backend.
    fn name(&self) -> &str;
}
