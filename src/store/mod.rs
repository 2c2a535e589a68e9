//! Durable step-record storage.
//!
//! This module provides the [`StepStore`] trait, the keyed idempotency table
//! behind the step executor, plus an in-memory implementation for tests and
//! a filesystem implementation for real persistence.

mod fs;
mod memory;

pub use fs::FsStepStore;
pub use memory::MemoryStepStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Keyed idempotency table: `(run id, step name) -> completed payload`.
///
/// This is the only state with cross-process visibility, so `record` must be
/// atomic per key: under concurrent retries of the same run, exactly one
/// writer wins and every caller observes the winning payload.
#[async_trait]
pub trait StepStore: Send + Sync {
    /// Returns the completed payload for the step, if one was recorded.
    async fn load(&self, run_id: &str, step: &str) -> Result<Option<Value>>;

    /// Records a completed payload, first writer wins.
    ///
    /// Returns the payload that actually won, which callers must treat as the
    /// step's result from then on.
    async fn record(&self, run_id: &str, step: &str, payload: Value) -> Result<Value>;
}
