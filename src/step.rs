//! Durable step execution.
//!
//! A step is a named unit of work whose result is recorded once and replayed
//! from cache on every later attempt of the same run. This is what lets a
//! multi-minute agent loop survive a crash or transient provider failure
//! without repeating already-billed side effects.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::StepStore;

/// Executes named steps with at-most-once side effects per run.
///
/// Scoped to a single workflow run; steps execute sequentially and observe a
/// total order matching invocation order. Step closures may themselves run
/// further steps through the same executor.
#[derive(Clone)]
pub struct StepExecutor {
    run_id: String,
    store: Arc<dyn StepStore>,
}

impl StepExecutor {
    /// Creates an executor for one workflow run.
    pub fn new(run_id: impl Into<String>, store: Arc<dyn StepStore>) -> Self {
        Self {
            run_id: run_id.into(),
            store,
        }
    }

    /// Returns the run this executor is scoped to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Runs a named step, replaying the recorded result if one exists.
    ///
    /// On a cache miss the closure executes; a successful result is recorded
    /// as complete before it is returned. A failing closure records nothing,
    /// so the next attempt of the run re-executes it while every previously
    /// completed step short-circuits from cache.
    pub async fn run<T, F, Fut>(&self, step: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(payload) = self.store.load(&self.run_id, step).await? {
            tracing::debug!(run_id = %self.run_id, step, "replaying step from cache");
            return decode(step, payload);
        }

        tracing::debug!(run_id = %self.run_id, step, "executing step");
        let result = f().await?;

        let payload = serde_json::to_value(&result)?;
        // The store resolves races between concurrent retries of this run;
        // whatever payload won is the step's result from here on.
        let winner = self.store.record(&self.run_id, step, payload).await?;
        decode(step, winner)
    }
}

fn decode<T: DeserializeOwned>(step: &str, payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| Error::StepPayload {
        step: step.to_string(),
        reason: e.to_string(),
    })
}
