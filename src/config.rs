//! Engine configuration and validation.
//!
//! Validates configuration before a workflow run starts to catch errors early.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Validation result containing all found issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors (fatal).
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Converts to a Result, failing if there are errors.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(Error::Config(self.errors.join("; ")))
        }
    }
}

/// Trait for validatable configuration types.
pub trait Validate {
    /// Validates the configuration and returns any issues found.
    fn validate(&self) -> ValidationResult;
}

/// Configuration for the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sandbox template to provision for each run.
    pub template_id: String,

    /// Hard ceiling on agent iterations per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How many prior conversation turns seed the agent context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Port the generated application listens on inside the sandbox.
    #[serde(default = "default_app_port")]
    pub app_port: u16,

    /// Idle window before the provider reclaims the sandbox.
    #[serde(default = "default_sandbox_idle_timeout", with = "duration_secs")]
    pub sandbox_idle_timeout: Duration,
}

fn default_max_iterations() -> u32 {
    15
}

fn default_history_limit() -> usize {
    5
}

fn default_app_port() -> u16 {
    3000
}

fn default_sandbox_idle_timeout() -> Duration {
    Duration::from_secs(1800)
}

/// Serde helper: durations as whole seconds in config files.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl EngineConfig {
    /// Creates a configuration for the given sandbox template with defaults.
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            max_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            app_port: default_app_port(),
            sandbox_idle_timeout: default_sandbox_idle_timeout(),
        }
    }

    /// Sets the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the history seeding limit.
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Sets the application port.
    pub fn with_app_port(mut self, app_port: u16) -> Self {
        self.app_port = app_port;
        self
    }

    /// Sets the sandbox idle timeout.
    pub fn with_sandbox_idle_timeout(mut self, timeout: Duration) -> Self {
        self.sandbox_idle_timeout = timeout;
        self
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid TOML config: {}", e)))
    }

    /// Loads a configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.template_id.trim().is_empty() {
            result.add_error("template_id cannot be empty");
        }

        if self.max_iterations == 0 {
            result.add_error("max_iterations must be at least 1");
        }

        if self.max_iterations > 50 {
            result.add_warning("max_iterations over 50 may run up large model bills");
        }

        if self.app_port == 0 {
            result.add_error("app_port must be non-zero");
        }

        if self.history_limit > 20 {
            result.add_warning("history_limit over 20 bloats the agent context");
        }

        if self.sandbox_idle_timeout < Duration::from_secs(60) {
            result.add_warning(
                "sandbox_idle_timeout under 60 seconds may reclaim the sandbox mid-run",
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_has_sensible_defaults() {
        let config = EngineConfig::new("code-interpreter-v1");

        assert_eq!(config.template_id, "code-interpreter-v1");
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.app_port, 3000);
        assert_eq!(config.sandbox_idle_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn config_builder_works() {
        let config = EngineConfig::new("tpl")
            .with_max_iterations(5)
            .with_history_limit(2)
            .with_app_port(8080)
            .with_sandbox_idle_timeout(Duration::from_secs(120));

        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.history_limit, 2);
        assert_eq!(config.app_port, 8080);
        assert_eq!(config.sandbox_idle_timeout, Duration::from_secs(120));
    }

    #[test]
    fn empty_template_fails_validation() {
        let config = EngineConfig::new("  ");
        let result = config.validate();

        assert!(!result.is_valid());
        assert!(result.errors[0].contains("template_id"));
    }

    #[test]
    fn zero_iterations_fails_validation() {
        let config = EngineConfig::new("tpl").with_max_iterations(0);
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn short_idle_timeout_warns() {
        let config = EngineConfig::new("tpl").with_sandbox_idle_timeout(Duration::from_secs(5));
        let result = config.validate();

        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn config_parses_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            template_id = "code-interpreter-v1"
            max_iterations = 10
            sandbox_idle_timeout = 600
            "#,
        )
        .expect("parse failed");

        assert_eq!(config.template_id, "code-interpreter-v1");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.sandbox_idle_timeout, Duration::from_secs(600));
        // Unspecified fields fall back to defaults
        assert_eq!(config.app_port, 3000);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("template_id = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
