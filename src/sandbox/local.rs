//! Local process-backed sandbox implementation.
//!
//! Each sandbox is a scratch directory on the local machine; commands run
//! through `sh -c` with the directory as working dir. This stands in for a
//! remote provider during development and tests while honoring the same
//! create/connect contract.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

use super::provider::{CommandOutput, Sandbox, SandboxProvider};

/// A sandbox backed by a local scratch directory.
pub struct LocalSandbox {
    /// Provider-assigned id.
    id: String,
    /// Scratch directory acting as the sandbox filesystem root.
    root: PathBuf,
    /// When the sandbox was provisioned.
    created_at: DateTime<Utc>,
    /// Current auto-reclaim window.
    idle_timeout: Mutex<Duration>,
}

impl LocalSandbox {
    fn new(id: String, root: PathBuf) -> Self {
        Self {
            id,
            root,
            created_at: Utc::now(),
            idle_timeout: Mutex::new(Duration::from_secs(300)),
        }
    }

    /// Returns when the sandbox was provisioned.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the current idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        *self.idle_timeout.lock().expect("idle timeout poisoned")
    }

    /// Resolves a sandbox-relative path, rejecting escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute() {
            return Err(Error::Sandbox(format!("absolute path not allowed: {}", path)));
        }
        if rel
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::Sandbox(format!("path escapes sandbox: {}", path)));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl Sandbox for LocalSandbox {
    fn id(&self) -> &str {
        &self.id
    }

    async fn set_idle_timeout(&self, timeout: Duration) -> Result<()> {
        *self
            .idle_timeout
            .lock()
            .map_err(|_| Error::Sandbox("idle timeout poisoned".to_string()))? = timeout;
        Ok(())
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        tracing::debug!(sandbox_id = %self.id, command, "running sandbox command");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| Error::Sandbox(format!("failed to launch command: {}", e)))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, content).await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Error::Sandbox(format!("failed to read {}: {}", path, e)))
    }

    async fn endpoint(&self, port: u16) -> Result<String> {
        // Local sandboxes are only reachable on the machine itself.
        Ok(format!("http://localhost:{}", port))
    }
}

/// Provider that provisions local scratch-directory sandboxes.
pub struct LocalSandboxProvider {
    base_dir: PathBuf,
    sandboxes: Mutex<HashMap<String, Arc<LocalSandbox>>>,
}

impl LocalSandboxProvider {
    /// Creates a provider rooting sandboxes under the given directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            sandboxes: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a provider rooted under the system temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("forgeloop-sandboxes"))
    }
}

#[async_trait]
impl SandboxProvider for LocalSandboxProvider {
    async fn create(&self, template_id: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let root = self.base_dir.join(&id);
        tokio::fs::create_dir_all(&root).await?;

        tracing::info!(sandbox_id = %id, template_id, root = ?root, "created local sandbox");

        let sandbox = Arc::new(LocalSandbox::new(id.clone(), root));
        self.sandboxes
            .lock()
            .map_err(|_| Error::Sandbox("provider poisoned".to_string()))?
            .insert(id.clone(), sandbox);
        Ok(id)
    }

    async fn connect(&self, sandbox_id: &str) -> Result<Arc<dyn Sandbox>> {
        if let Some(sandbox) = self
            .sandboxes
            .lock()
            .map_err(|_| Error::Sandbox("provider poisoned".to_string()))?
            .get(sandbox_id)
        {
            return Ok(sandbox.clone());
        }

        // Another provider instance (a resumed process) may own the directory
        // even though this one never created the handle.
        let root = self.base_dir.join(sandbox_id);
        if tokio::fs::try_exists(&root).await? {
            let sandbox = Arc::new(LocalSandbox::new(sandbox_id.to_string(), root));
            self.sandboxes
                .lock()
                .map_err(|_| Error::Sandbox("provider poisoned".to_string()))?
                .insert(sandbox_id.to_string(), sandbox.clone());
            return Ok(sandbox);
        }

        Err(Error::Sandbox(format!("unknown sandbox: {}", sandbox_id)))
    }
}
