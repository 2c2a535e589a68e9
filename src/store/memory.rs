//! In-memory step store for tests and single-process runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

use super::StepStore;

/// Step store backed by a process-local map.
///
/// Durable only for the lifetime of the process; useful in tests and as the
/// reference semantics for other implementations.
#[derive(Debug, Default)]
pub struct MemoryStepStore {
    records: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStepStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded steps, across all runs.
    pub fn len(&self) -> usize {
        self.records.lock().expect("step store poisoned").len()
    }

    /// Returns true if no steps have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StepStore for MemoryStepStore {
    async fn load(&self, run_id: &str, step: &str) -> Result<Option<Value>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Store("step store poisoned".to_string()))?;
        Ok(records.get(&(run_id.to_string(), step.to_string())).cloned())
    }

    async fn record(&self, run_id: &str, step: &str, payload: Value) -> Result<Value> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| Error::Store("step store poisoned".to_string()))?;
        let winner = records
            .entry((run_id.to_string(), step.to_string()))
            .or_insert(payload);
        Ok(winner.clone())
    }
}
