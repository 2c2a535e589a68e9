//! Error types for the forgeloop workflow engine.

use thiserror::Error;

/// Top-level error type for workflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Sandbox provisioning or provider operation failed.
    #[error("sandbox error: {0}")]
    Sandbox(String),

    /// Durable step store operation failed.
    #[error("step store error: {0}")]
    Store(String),

    /// A durable step replayed with a payload that no longer deserializes.
    #[error("step '{step}' replayed with incompatible payload: {reason}")]
    StepPayload { step: String, reason: String },

    /// The generative backend failed at the transport level.
    #[error("agent backend error: {0}")]
    Backend(String),

    /// Tool arguments failed validation before execution.
    #[error("invalid arguments for tool '{tool}': {reason}")]
    ToolValidation { tool: String, reason: String },

    /// Conversation store operation failed.
    #[error("conversation store error: {0}")]
    History(String),

    /// Engine configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error during store or sandbox operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, Error>;
