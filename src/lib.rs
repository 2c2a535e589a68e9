//! Forgeloop - durable workflow engine for sandboxed coding agents
//!
//! This library drives an iterative agent against an ephemeral compute
//! sandbox and persists a terminal outcome that survives process restarts:
//! every side-effecting stage runs as a durable, idempotent step, so retried
//! or resumed attempts replay completed work from cache instead of repeating
//! it.

pub mod blackboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod outcome;
pub mod prompt;
pub mod retry;
pub mod router;
pub mod sandbox;
pub mod step;
pub mod store;
pub mod summary;
pub mod tools;

pub use error::Error;

pub use blackboard::Blackboard;
pub use config::{EngineConfig, Validate, ValidationResult};
pub use engine::WorkflowEngine;
pub use history::{ConversationStore, MemoryConversationStore, Role, StoredTurn};
pub use llm::{
    AgentBackend, AgentTurn, ChatMessage, CompletionRequest, ScriptedBackend, ToolCall, ToolSpec,
};
pub use outcome::{
    Artifact, ResponseKind, TerminalRecord, TriggerEvent, WorkflowOutput, NO_ARTIFACT_DIAGNOSTIC,
};
pub use retry::RetryPolicy;
pub use router::{route, RouterDecision, TerminationReason};
pub use sandbox::{CommandOutput, LocalSandbox, LocalSandboxProvider, Sandbox, SandboxProvider};
pub use step::StepExecutor;
pub use store::{FsStepStore, MemoryStepStore, StepStore};
pub use summary::{
    extract_summary, strip_markers, synthesize_summary, wrap_summary, SUMMARY_CLOSE, SUMMARY_OPEN,
};
pub use tools::{FileEntry, ToolOutcome, CREATE_OR_UPDATE_FILES, READ_FILES, TERMINAL};
