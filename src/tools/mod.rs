//! Agent tool layer: terminal, file write, file read.
//!
//! The three tools are exposed identically to every backend. Arguments are
//! validated before anything executes; execution happens inside nested
//! durable steps; and every failure is rendered into the tool's result
//! *string* so the agent can read it and adapt. A tool fault never aborts
//! the workflow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::llm::{ToolCall, ToolSpec};
use crate::sandbox::Sandbox;
use crate::step::StepExecutor;

/// Terminal tool name.
pub const TERMINAL: &str = "terminal";

/// File write/update tool name.
pub const CREATE_OR_UPDATE_FILES: &str = "createOrUpdateFiles";

/// File read tool name.
pub const READ_FILES: &str = "readFiles";

/// One file in a write or read payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Sandbox-relative path.
    pub path: String,
    /// File content.
    pub content: String,
}

/// Arguments for the terminal tool.
#[derive(Debug, Clone, Deserialize)]
pub struct TerminalArgs {
    /// Shell command to run inside the sandbox.
    pub command: String,
}

/// Arguments for the file write tool.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrUpdateFilesArgs {
    /// Files to upsert.
    pub files: Vec<FileEntry>,
}

/// Arguments for the file read tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadFilesArgs {
    /// Sandbox-relative paths to read.
    pub paths: Vec<String>,
}

/// A tool call whose arguments passed validation.
#[derive(Debug, Clone)]
pub enum ValidatedCall {
    Terminal(TerminalArgs),
    CreateOrUpdateFiles(CreateOrUpdateFilesArgs),
    ReadFiles(ReadFilesArgs),
}

/// Outcome of one tool invocation.
///
/// `result` is the string fed back to the agent. `written` carries the files
/// that actually landed in the sandbox; the engine merges them into the
/// blackboard *after* the durable step returns, so replayed attempts
/// re-derive the same merge from the cached payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Result string fed back to the agent.
    pub result: String,
    /// Files successfully written, to merge into the blackboard.
    pub written: BTreeMap<String, String>,
}

impl ToolOutcome {
    fn message(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            written: BTreeMap::new(),
        }
    }
}

/// Returns the schemas for all three tools.
pub fn specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: TERMINAL.to_string(),
            description: "Run a shell command inside the sandbox".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string" }
                },
                "required": ["command"]
            }),
        },
        ToolSpec {
            name: CREATE_OR_UPDATE_FILES.to_string(),
            description: "Create or update files in the sandbox".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "files": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": { "type": "string" },
                                "content": { "type": "string" }
                            },
                            "required": ["path", "content"]
                        }
                    }
                },
                "required": ["files"]
            }),
        },
        ToolSpec {
            name: READ_FILES.to_string(),
            description: "Read files from the sandbox".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "paths": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["paths"]
            }),
        },
    ]
}

/// Validates a tool call's arguments without executing anything.
///
/// Malformed input is rejected here, before any side effect; partially valid
/// input never executes.
pub fn validate(call: &ToolCall) -> Result<ValidatedCall> {
    let invalid = |reason: String| Error::ToolValidation {
        tool: call.tool.clone(),
        reason,
    };

    match call.tool.as_str() {
        TERMINAL => {
            let args: TerminalArgs = serde_json::from_value(call.arguments.clone())
                .map_err(|e| invalid(e.to_string()))?;
            if args.command.trim().is_empty() {
                return Err(invalid("command cannot be empty".to_string()));
            }
            Ok(ValidatedCall::Terminal(args))
        }
        CREATE_OR_UPDATE_FILES => {
            let args: CreateOrUpdateFilesArgs = serde_json::from_value(call.arguments.clone())
                .map_err(|e| invalid(e.to_string()))?;
            if args.files.is_empty() {
                return Err(invalid("files cannot be empty".to_string()));
            }
            if let Some(entry) = args.files.iter().find(|f| f.path.trim().is_empty()) {
                return Err(invalid(format!(
                    "file path cannot be empty (content length {})",
                    entry.content.len()
                )));
            }
            Ok(ValidatedCall::CreateOrUpdateFiles(args))
        }
        READ_FILES => {
            let args: ReadFilesArgs = serde_json::from_value(call.arguments.clone())
                .map_err(|e| invalid(e.to_string()))?;
            if args.paths.is_empty() {
                return Err(invalid("paths cannot be empty".to_string()));
            }
            Ok(ValidatedCall::ReadFiles(args))
        }
        other => Err(invalid(format!("unknown tool '{}'", other))),
    }
}

/// Executes one tool call as a nested durable step.
///
/// `seq` is the run-scoped invocation sequence number; replayed attempts
/// regenerate the same sequence, so the step names line up with the cache.
pub async fn dispatch(
    steps: &StepExecutor,
    seq: u64,
    sandbox: &dyn Sandbox,
    call: &ToolCall,
) -> Result<ToolOutcome> {
    let validated = match validate(call) {
        Ok(validated) => validated,
        Err(e) => {
            // No side effects happened; the agent reads the rejection and
            // gets another chance.
            tracing::warn!(tool = %call.tool, error = %e, "rejected tool call");
            return Ok(ToolOutcome::message(e.to_string()));
        }
    };

    match validated {
        ValidatedCall::Terminal(args) => {
            steps
                .run(&format!("terminal-{}", seq), || async {
                    Ok(run_terminal(sandbox, &args).await)
                })
                .await
        }
        ValidatedCall::CreateOrUpdateFiles(args) => {
            steps
                .run(&format!("create-or-update-files-{}", seq), || async {
                    Ok(write_files(sandbox, &args).await)
                })
                .await
        }
        ValidatedCall::ReadFiles(args) => {
            steps
                .run(&format!("read-files-{}", seq), || async {
                    read_files(sandbox, &args).await
                })
                .await
        }
    }
}

async fn run_terminal(sandbox: &dyn Sandbox, args: &TerminalArgs) -> ToolOutcome {
    match sandbox.run_command(&args.command).await {
        Ok(output) if output.success() => {
            let mut result = output.stdout;
            if !output.stderr.trim().is_empty() {
                result.push_str("\nstderr: ");
                result.push_str(&output.stderr);
            }
            ToolOutcome::message(result)
        }
        Ok(output) => ToolOutcome::message(format!(
            "command failed with exit code {}\nstdout: {}\nstderr: {}",
            output.exit_code, output.stdout, output.stderr
        )),
        Err(e) => ToolOutcome::message(format!("command failed: {}", e)),
    }
}

async fn write_files(sandbox: &dyn Sandbox, args: &CreateOrUpdateFilesArgs) -> ToolOutcome {
    let mut written = BTreeMap::new();

    for entry in &args.files {
        match sandbox.write_file(&entry.path, &entry.content).await {
            Ok(()) => {
                written.insert(entry.path.clone(), entry.content.clone());
            }
            Err(e) => {
                // Files written before the failure stay written (and merged);
                // the batch reports the failure.
                return ToolOutcome {
                    result: format!("failed to write {}: {}", entry.path, e),
                    written,
                };
            }
        }
    }

    ToolOutcome {
        result: format!("created or updated {} file(s)", written.len()),
        written,
    }
}

async fn read_files(sandbox: &dyn Sandbox, args: &ReadFilesArgs) -> Result<ToolOutcome> {
    let mut entries = Vec::new();
    let mut failures = Vec::new();

    for path in &args.paths {
        match sandbox.read_file(path).await {
            Ok(content) => entries.push(FileEntry {
                path: path.clone(),
                content,
            }),
            Err(e) => failures.push(format!("could not read {}: {}", path, e)),
        }
    }

    let mut result = serde_json::to_string(&entries)?;
    for failure in &failures {
        result.push('\n');
        result.push_str(failure);
    }

    Ok(ToolOutcome {
        result,
        written: BTreeMap::new(),
    })
}
