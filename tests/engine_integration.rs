//! End-to-end workflow runs over in-process collaborators.
//!
//! These tests drive the full engine with a scripted backend, a local
//! sandbox provider, and in-memory stores, suitable for CI.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use forgeloop::{
    AgentTurn, EngineConfig, LocalSandboxProvider, MemoryConversationStore, MemoryStepStore,
    ResponseKind, ScriptedBackend, StoredTurn, ToolCall, TriggerEvent, WorkflowEngine,
    NO_ARTIFACT_DIAGNOSTIC,
};

struct Fixture {
    _sandbox_dir: TempDir,
    backend: Arc<ScriptedBackend>,
    history: Arc<MemoryConversationStore>,
    engine: WorkflowEngine,
}

/// Builds an engine over scripted turns and fresh in-process collaborators.
fn fixture(config: EngineConfig, turns: Vec<AgentTurn>) -> Fixture {
    let sandbox_dir = TempDir::new().expect("failed to create sandbox dir");
    let backend = Arc::new(ScriptedBackend::new(turns));
    let history = Arc::new(MemoryConversationStore::new());

    let engine = WorkflowEngine::new(
        config,
        Arc::new(LocalSandboxProvider::new(sandbox_dir.path())),
        backend.clone(),
        history.clone(),
        Arc::new(MemoryStepStore::new()),
    )
    .expect("engine construction failed");

    Fixture {
        _sandbox_dir: sandbox_dir,
        backend,
        history,
        engine,
    }
}

fn config() -> EngineConfig {
    EngineConfig::new("node-22")
}

fn write_files_call(files: serde_json::Value) -> ToolCall {
    ToolCall {
        tool: "createOrUpdateFiles".to_string(),
        arguments: json!({ "files": files }),
    }
}

fn terminal_call(command: &str) -> ToolCall {
    ToolCall {
        tool: "terminal".to_string(),
        arguments: json!({ "command": command }),
    }
}

#[tokio::test]
async fn successful_run_persists_a_result_record() {
    let fx = fixture(
        config(),
        vec![
            AgentTurn::tools(vec![
                write_files_call(json!([{"path": "app/page.tsx", "content": "<Page />"}])),
                terminal_call("echo install ok"),
            ]),
            AgentTurn::text("All done <task_summary>Built a landing page</task_summary>"),
            AgentTurn::text("Landing Page"),
        ],
    );

    let trigger = TriggerEvent::new("evt-1", "Build a landing page", "proj-1");
    let output = fx.engine.run(&trigger).await.expect("run failed");

    assert_eq!(output.summary, "Built a landing page");
    assert_eq!(output.title, "Landing Page");
    assert_eq!(output.endpoint_url, "http://localhost:3000");
    assert_eq!(output.files.len(), 1);
    assert_eq!(output.files["app/page.tsx"], "<Page />");

    let records = fx.history.terminals("proj-1");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ResponseKind::Result);
    assert_eq!(records[0].summary, "Built a landing page");
    let artifact = records[0].artifact.as_ref().expect("artifact missing");
    assert_eq!(artifact.endpoint_url, "http://localhost:3000");
    assert_eq!(artifact.files.len(), 1);

    // Two loop turns plus the title request.
    assert_eq!(fx.backend.request_count(), 3);
}

#[tokio::test]
async fn run_without_files_is_classified_as_error() {
    let fx = fixture(
        config(),
        vec![AgentTurn::text(
            "<task_summary>Nothing to build</task_summary>",
        )],
    );

    let trigger = TriggerEvent::new("evt-2", "Do nothing", "proj-2");
    let output = fx.engine.run(&trigger).await.expect("run failed");

    assert_eq!(output.summary, NO_ARTIFACT_DIAGNOSTIC);
    assert!(output.files.is_empty());
    assert!(output.title.is_empty());

    let records = fx.history.terminals("proj-2");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ResponseKind::Error);
    assert!(records[0].artifact.is_none());

    // No artifact means no title request either.
    assert_eq!(fx.backend.request_count(), 1);
}

#[tokio::test]
async fn unmarked_text_turn_completes_the_run() {
    let fx = fixture(
        config(),
        vec![
            AgentTurn::tools(vec![write_files_call(
                json!([{"path": "a.txt", "content": "1"}]),
            )]),
            AgentTurn::text("I built the thing"),
            AgentTurn::default(),
        ],
    );

    let trigger = TriggerEvent::new("evt-3", "Build the thing", "proj-3");
    let output = fx.engine.run(&trigger).await.expect("run failed");

    assert_eq!(output.summary, "I built the thing");
    // The empty title turn falls back to a summary-derived title.
    assert_eq!(output.title, "I built the thing");
}

#[tokio::test]
async fn iteration_ceiling_triggers_fallback_synthesis() {
    let fx = fixture(
        config().with_max_iterations(2),
        vec![
            AgentTurn::tools(vec![write_files_call(
                json!([{"path": "a.txt", "content": "1"}]),
            )]),
            AgentTurn::tools(vec![terminal_call("echo still going")]),
            // Queue exhausted: the final summary request and the title
            // request both come back empty.
        ],
    );

    let trigger = TriggerEvent::new("evt-4", "Build a landing page", "proj-4");
    let output = fx.engine.run(&trigger).await.expect("run failed");

    assert_eq!(
        output.summary,
        "Completed task: Build a landing page. Created 1 file(s)."
    );

    let records = fx.history.terminals("proj-4");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ResponseKind::Result);

    // Two loop turns, the explicit summary request, the title request; the
    // ceiling keeps a third loop turn from ever firing.
    assert_eq!(fx.backend.request_count(), 4);
}

#[tokio::test]
async fn prior_turns_seed_the_agent_context() {
    let fx = fixture(
        config(),
        vec![AgentTurn::text("<task_summary>ok</task_summary>")],
    );
    for i in 0..7 {
        fx.history
            .push_turn("proj-5", StoredTurn::user(format!("earlier {}", i)));
    }

    let trigger = TriggerEvent::new("evt-5", "Continue the work", "proj-5");
    fx.engine.run(&trigger).await.expect("run failed");

    let requests = fx.backend.requests();
    let messages = &requests[0].messages;

    // Most recent five prior turns, oldest first, then the new request.
    assert_eq!(messages.len(), 6);
    assert_eq!(
        messages[0],
        forgeloop::ChatMessage::User {
            content: "earlier 2".to_string()
        }
    );
    assert_eq!(
        messages[5],
        forgeloop::ChatMessage::User {
            content: "Continue the work".to_string()
        }
    );
}

#[tokio::test]
async fn tool_results_feed_back_before_the_next_turn() {
    let fx = fixture(
        config(),
        vec![
            AgentTurn::tools(vec![terminal_call("echo probe")]),
            AgentTurn::text("<task_summary>done</task_summary>"),
        ],
    );

    let trigger = TriggerEvent::new("evt-6", "Probe", "proj-6");
    fx.engine.run(&trigger).await.expect("run failed");

    let requests = fx.backend.requests();
    let second_turn_messages = &requests[1].messages;

    let call_index = second_turn_messages
        .iter()
        .position(|m| matches!(m, forgeloop::ChatMessage::ToolCall { .. }))
        .expect("tool call not recorded");
    match &second_turn_messages[call_index + 1] {
        forgeloop::ChatMessage::ToolResult { tool, content } => {
            assert_eq!(tool, "terminal");
            assert_eq!(content.trim(), "probe");
        }
        other => panic!("expected tool result after tool call, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_tool_arguments_do_not_abort_the_run() {
    let fx = fixture(
        config(),
        vec![
            AgentTurn::tools(vec![ToolCall {
                tool: "terminal".to_string(),
                arguments: json!({ "wrong": true }),
            }]),
            AgentTurn::text("<task_summary>recovered</task_summary>"),
        ],
    );

    let trigger = TriggerEvent::new("evt-7", "Recover", "proj-7");
    let output = fx.engine.run(&trigger).await.expect("run failed");

    // The rejection reached the agent as a result string and the loop went on.
    let requests = fx.backend.requests();
    let fed_back = requests[1].messages.iter().any(|m| matches!(
        m,
        forgeloop::ChatMessage::ToolResult { content, .. } if content.contains("invalid arguments")
    ));
    assert!(fed_back);
    assert_eq!(output.summary, NO_ARTIFACT_DIAGNOSTIC);
}

#[tokio::test]
async fn empty_trigger_fields_are_rejected() {
    let fx = fixture(config(), vec![]);

    let trigger = TriggerEvent::new("evt-8", "", "proj-8");
    assert!(fx.engine.run(&trigger).await.is_err());

    // Nothing executed: no terminal record, no backend calls.
    assert!(fx.history.terminals("proj-8").is_empty());
    assert_eq!(fx.backend.request_count(), 0);
}
