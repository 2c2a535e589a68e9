//! Trigger and outcome types for a workflow run.
//!
//! A run is born from a [`TriggerEvent`], ends in exactly one
//! [`TerminalRecord`], and hands a [`WorkflowOutput`] back to the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnostic persisted when a run terminates without producing any files.
pub const NO_ARTIFACT_DIAGNOSTIC: &str = "Something went wrong. Please try again.";

/// Inbound trigger consumed once per workflow run.
///
/// Delivered by the external event bus; `event_id` is the run's identity and
/// the key every durable step is scoped under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Unique id of the triggering event.
    pub event_id: String,
    /// The natural-language task.
    pub request_text: String,
    /// Project the run belongs to.
    pub project_id: String,
}

impl TriggerEvent {
    /// Creates a trigger event.
    pub fn new(
        event_id: impl Into<String>,
        request_text: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            request_text: request_text.into(),
            project_id: project_id.into(),
        }
    }
}

/// Classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseKind {
    /// The run produced artifacts.
    Result,
    /// The run failed to produce artifacts.
    Error,
}

/// Artifact linked to a successful terminal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Externally reachable sandbox address.
    pub endpoint_url: String,
    /// Short generated title.
    pub title: String,
    /// Snapshot of every file the run produced.
    pub files: BTreeMap<String, String>,
}

/// The single immutable record a run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalRecord {
    /// Success or error classification.
    pub kind: ResponseKind,
    /// Marker-free summary text.
    pub summary: String,
    /// Linked artifact; present iff `kind` is `Result`.
    pub artifact: Option<Artifact>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl TerminalRecord {
    /// Classifies a finished run and builds its terminal record.
    ///
    /// No files means `Error` with a fixed diagnostic, even when a summary
    /// exists. Otherwise `Result` with the summary and the linked artifact.
    pub fn classify(
        files: BTreeMap<String, String>,
        summary: &str,
        endpoint_url: &str,
        title: &str,
    ) -> Self {
        if files.is_empty() {
            return Self::failure();
        }

        Self {
            kind: ResponseKind::Result,
            summary: summary.to_string(),
            artifact: Some(Artifact {
                endpoint_url: endpoint_url.to_string(),
                title: title.to_string(),
                files,
            }),
            created_at: Utc::now(),
        }
    }

    /// Builds the fixed-diagnostic error record.
    pub fn failure() -> Self {
        Self {
            kind: ResponseKind::Error,
            summary: NO_ARTIFACT_DIAGNOSTIC.to_string(),
            artifact: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true for `Result` records.
    pub fn is_result(&self) -> bool {
        self.kind == ResponseKind::Result
    }
}

/// Value returned to the programmatic caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Externally reachable sandbox address.
    pub endpoint_url: String,
    /// Short generated title.
    pub title: String,
    /// Files the run produced.
    pub files: BTreeMap<String, String>,
    /// Final marker-free summary.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn empty_files_classify_as_error_despite_summary() {
        let record = TerminalRecord::classify(BTreeMap::new(), "done", "http://x", "t");

        assert_eq!(record.kind, ResponseKind::Error);
        assert_eq!(record.summary, NO_ARTIFACT_DIAGNOSTIC);
        assert!(record.artifact.is_none());
    }

    #[test]
    fn files_and_summary_classify_as_result() {
        let record =
            TerminalRecord::classify(files(&[("a.txt", "x")]), "done", "http://host:3000", "Page");

        assert!(record.is_result());
        assert_eq!(record.summary, "done");
        let artifact = record.artifact.expect("artifact missing");
        assert_eq!(artifact.endpoint_url, "http://host:3000");
        assert_eq!(artifact.title, "Page");
        assert_eq!(artifact.files.len(), 1);
    }

    #[test]
    fn response_kind_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ResponseKind::Result).unwrap(),
            "\"RESULT\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseKind::Error).unwrap(),
            "\"ERROR\""
        );
    }
}
