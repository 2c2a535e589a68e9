//! Shared mutable state for one workflow run.
//!
//! The blackboard holds the data the agent loop accumulates: the completion
//! summary and the files produced so far. It is owned by a single run and
//! never shared across runs. All mutation goes through explicit merge
//! operations so replayed steps can re-derive the same state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Run-scoped mutable workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blackboard {
    /// Completion summary; empty means the run has not finished.
    summary: String,
    /// Files produced in the sandbox, path to content.
    files: BTreeMap<String, String>,
}

impl Blackboard {
    /// Creates an empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current summary text.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns true once a completion summary has been recorded.
    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    /// Records the completion summary.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    /// Returns the accumulated files.
    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Returns the number of accumulated files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Merges files into the accumulated map, last write wins per path.
    ///
    /// Existing entries for other paths are preserved; the map is never
    /// replaced wholesale.
    pub fn merge_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (path, content) in files {
            self.files.insert(path, content);
        }
    }

    /// Consumes the blackboard, returning the file map.
    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }
}
