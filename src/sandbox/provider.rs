//! Sandbox provider trait and types.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Output of a command executed inside a sandbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code; -1 when the process died without one.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Returns true when the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An active ephemeral compute environment.
///
/// Handles are cheap references; the provider owns the underlying resource
/// and reclaims it automatically once the idle timeout elapses.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Returns the provider-assigned sandbox id.
    fn id(&self) -> &str;

    /// Extends the provider's auto-reclaim window.
    async fn set_idle_timeout(&self, timeout: Duration) -> Result<()>;

    /// Executes a shell command inside the sandbox.
    async fn run_command(&self, command: &str) -> Result<CommandOutput>;

    /// Writes (or overwrites) one file inside the sandbox.
    async fn write_file(&self, path: &str, content: &str) -> Result<()>;

    /// Reads one file from the sandbox.
    async fn read_file(&self, path: &str) -> Result<String>;

    /// Resolves the externally reachable address for a port.
    ///
    /// Derived fresh on every call; the underlying host may change across
    /// provider-level restarts, so implementations must not memoize.
    async fn endpoint(&self, port: u16) -> Result<String>;
}

/// Provider for creating and re-attaching to sandboxes.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Provisions a sandbox from a template and returns its id.
    async fn create(&self, template_id: &str) -> Result<String>;

    /// Attaches to an existing sandbox by id.
    ///
    /// Called on every workflow attempt: the id is durable, the handle is
    /// not, so resumed attempts reconnect instead of provisioning again.
    async fn connect(&self, sandbox_id: &str) -> Result<Arc<dyn Sandbox>>;
}
