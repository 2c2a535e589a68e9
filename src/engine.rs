//! The durable agent-orchestration workflow engine.
//!
//! One [`WorkflowEngine::run`] call drives a full workflow: acquire a
//! sandbox, seed agent context, loop the agent against the tools until the
//! router terminates, extract the completion summary, and persist exactly one
//! terminal record. Every side-effecting stage goes through the step
//! executor, so a crashed or failed attempt resumes from its last checkpoint
//! instead of repeating work.

use std::sync::Arc;

use crate::blackboard::Blackboard;
use crate::config::{EngineConfig, Validate};
use crate::error::{Error, Result};
use crate::history::{ConversationStore, Role, StoredTurn};
use crate::llm::{AgentBackend, AgentTurn, ChatMessage, CompletionRequest};
use crate::outcome::{TerminalRecord, TriggerEvent, WorkflowOutput};
use crate::retry::RetryPolicy;
use crate::router::{route, RouterDecision};
use crate::sandbox::SandboxProvider;
use crate::step::StepExecutor;
use crate::store::StepStore;
use crate::summary::{extract_summary, strip_markers, synthesize_summary, wrap_summary};
use crate::{prompt, tools};

/// Durable workflow engine.
///
/// Holds the external collaborators; each [`run`](Self::run) call executes
/// one independent workflow instance. Instances may run concurrently, but
/// steps within one instance execute sequentially.
pub struct WorkflowEngine {
    config: EngineConfig,
    sandboxes: Arc<dyn SandboxProvider>,
    backend: Arc<dyn AgentBackend>,
    history: Arc<dyn ConversationStore>,
    steps: Arc<dyn StepStore>,
}

impl WorkflowEngine {
    /// Creates an engine, validating the configuration up front.
    pub fn new(
        config: EngineConfig,
        sandboxes: Arc<dyn SandboxProvider>,
        backend: Arc<dyn AgentBackend>,
        history: Arc<dyn ConversationStore>,
        steps: Arc<dyn StepStore>,
    ) -> Result<Self> {
        let warnings = config.validate().into_result()?;
        for warning in warnings {
            tracing::warn!(warning = %warning, "engine configuration warning");
        }

        Ok(Self {
            config,
            sandboxes,
            backend,
            history,
            steps,
        })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes one workflow attempt for the trigger.
    ///
    /// Re-entrant per trigger: a retried or resumed attempt replays completed
    /// steps from the store and continues where the previous attempt stopped.
    pub async fn run(&self, trigger: &TriggerEvent) -> Result<WorkflowOutput> {
        validate_trigger(trigger)?;

        let steps = StepExecutor::new(&trigger.event_id, self.steps.clone());
        tracing::info!(
            run_id = %trigger.event_id,
            project_id = %trigger.project_id,
            backend = self.backend.name(),
            "starting workflow run"
        );

        // Acquire the sandbox once per run; replays reuse the recorded id.
        let sandbox_id: String = steps
            .run("create-sandbox", || {
                self.sandboxes.create(&self.config.template_id)
            })
            .await?;
        let sandbox = self.sandboxes.connect(&sandbox_id).await?;

        // Best effort: a failed extension must not kill a healthy run.
        if let Err(e) = sandbox
            .set_idle_timeout(self.config.sandbox_idle_timeout)
            .await
        {
            tracing::warn!(error = %e, "failed to extend sandbox idle timeout");
        }

        let prior: Vec<StoredTurn> = steps
            .run("load-history", || {
                self.history
                    .recent_turns(&trigger.project_id, self.config.history_limit)
            })
            .await?;

        let mut transcript: Vec<ChatMessage> = prior
            .into_iter()
            .map(|turn| match turn.role {
                Role::User => ChatMessage::User {
                    content: turn.content,
                },
                Role::Assistant => ChatMessage::Assistant {
                    content: turn.content,
                },
            })
            .collect();
        transcript.push(ChatMessage::User {
            content: trigger.request_text.clone(),
        });

        let mut blackboard = Blackboard::new();
        let mut tool_seq: u64 = 0;
        let mut iteration: u32 = 0;

        loop {
            match route(&blackboard, iteration, self.config.max_iterations) {
                RouterDecision::Terminate(reason) => {
                    tracing::info!(?reason, iteration, "agent loop terminated");
                    break;
                }
                RouterDecision::Continue => {}
            }

            let request = self.completion_request(&transcript);
            let turn: AgentTurn = steps
                .run(&format!("agent-turn-{}", iteration), || {
                    self.backend.complete(request)
                })
                .await?;

            // Feed every tool result back before the next turn.
            for call in &turn.tool_calls {
                transcript.push(ChatMessage::ToolCall {
                    tool: call.tool.clone(),
                    arguments: call.arguments.clone(),
                });

                let outcome = tools::dispatch(&steps, tool_seq, sandbox.as_ref(), call).await?;
                tool_seq += 1;

                // Merge from the step's returned payload, never from inside
                // the closure: replayed attempts re-derive the same state.
                blackboard.merge_files(outcome.written);
                transcript.push(ChatMessage::ToolResult {
                    tool: call.tool.clone(),
                    content: outcome.result,
                });
            }

            if let Some(text) = turn.non_empty_text() {
                let recorded = observe_response(text, &mut blackboard);
                transcript.push(ChatMessage::Assistant { content: recorded });
            }

            iteration += 1;
        }

        // The loop can end on the ceiling with no summary; ask once, then
        // synthesize.
        if !blackboard.has_summary() {
            let mut closing = transcript.clone();
            closing.push(ChatMessage::User {
                content: prompt::FINAL_SUMMARY_INSTRUCTION.to_string(),
            });
            let request = self.completion_request(&closing);
            let turn: AgentTurn = steps
                .run("final-summary", || self.backend.complete(request))
                .await?;

            if let Some(text) = turn.non_empty_text() {
                let summary = extract_summary(text).unwrap_or_else(|| text.to_string());
                blackboard.set_summary(summary);
            }

            if !blackboard.has_summary() {
                let file_count = blackboard.file_count();
                blackboard.set_summary(synthesize_summary(&trigger.request_text, file_count));
                tracing::warn!(file_count, "agent never produced a summary, synthesized one");
            }
        }

        let summary = strip_markers(blackboard.summary());
        let files = blackboard.files().clone();

        // Re-derived by the closure each time it actually executes; the host
        // may change across provider restarts.
        let endpoint_url: String = steps
            .run("resolve-endpoint", || sandbox.endpoint(self.config.app_port))
            .await?;

        let title: String = if files.is_empty() {
            String::new()
        } else {
            steps
                .run("artifact-title", || async {
                    Ok(self.generate_title(&summary).await)
                })
                .await?
        };

        // One durable step, one terminal record: retried attempts replay the
        // record instead of double-writing.
        let record: TerminalRecord = steps
            .run("persist-result", || async {
                let record = TerminalRecord::classify(files.clone(), &summary, &endpoint_url, &title);
                self.history.write_terminal(&trigger.project_id, &record).await?;
                Ok(record)
            })
            .await?;

        tracing::info!(
            run_id = %trigger.event_id,
            kind = ?record.kind,
            files = record.artifact.as_ref().map(|a| a.files.len()).unwrap_or(0),
            "workflow run finished"
        );

        let summary = record.summary.clone();
        let (title, files) = match record.artifact {
            Some(artifact) => (artifact.title, artifact.files),
            None => (String::new(), Default::default()),
        };

        Ok(WorkflowOutput {
            endpoint_url,
            title,
            files,
            summary,
        })
    }

    /// Runs the workflow, retrying failed attempts from the last checkpoint.
    ///
    /// When every attempt fails, a terminal `ERROR` record is still persisted
    /// (best effort) before the last error is returned: no run ends without a
    /// record.
    pub async fn run_with_retries(
        &self,
        trigger: &TriggerEvent,
        policy: &RetryPolicy,
    ) -> Result<WorkflowOutput> {
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts() {
            match self.run(trigger).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "workflow attempt failed");
                    if attempt < policy.max_attempts() {
                        tokio::time::sleep(policy.delay_after(attempt)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        if let Err(e) = self
            .history
            .write_terminal(&trigger.project_id, &TerminalRecord::failure())
            .await
        {
            tracing::error!(error = %e, "failed to persist terminal error record");
        }

        Err(last_error
            .unwrap_or_else(|| Error::Config("retry policy ran no attempts".to_string())))
    }

    fn completion_request(&self, transcript: &[ChatMessage]) -> CompletionRequest {
        CompletionRequest {
            system: prompt::SYSTEM_PROMPT.to_string(),
            messages: transcript.to_vec(),
            tools: tools::specs(),
        }
    }

    /// Generates a short artifact title, falling back to a derived one.
    async fn generate_title(&self, summary: &str) -> String {
        let request = CompletionRequest {
            system: prompt::TITLE_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::User {
                content: prompt::title_request(summary),
            }],
            tools: Vec::new(),
        };

        match self.backend.complete(request).await {
            Ok(turn) => match turn.non_empty_text() {
                Some(text) => prompt::derive_title(&strip_markers(text)),
                None => prompt::derive_title(summary),
            },
            Err(e) => {
                tracing::warn!(error = %e, "title generation failed, deriving from summary");
                prompt::derive_title(summary)
            }
        }
    }
}

/// Inspects an agent text turn for the completion signal.
///
/// Marked text sets the summary from the marker's inner text and is recorded
/// verbatim. Unmarked text becomes the summary itself and the recorded turn
/// is rewritten with the marker pair so the transcript stays self-consistent.
/// Returns the turn text to record.
fn observe_response(text: &str, blackboard: &mut Blackboard) -> String {
    match extract_summary(text) {
        Some(inner) => {
            blackboard.set_summary(inner);
            text.to_string()
        }
        None => {
            blackboard.set_summary(text.trim());
            wrap_summary(text)
        }
    }
}

fn validate_trigger(trigger: &TriggerEvent) -> Result<()> {
    if trigger.event_id.trim().is_empty() {
        return Err(Error::Config("trigger event_id cannot be empty".to_string()));
    }
    if trigger.request_text.trim().is_empty() {
        return Err(Error::Config("trigger request_text cannot be empty".to_string()));
    }
    if trigger.project_id.trim().is_empty() {
        return Err(Error::Config("trigger project_id cannot be empty".to_string()));
    }
    Ok(())
}
