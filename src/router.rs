//! Loop routing: decide after each agent turn whether to continue.
//!
//! The router is a pure function of the blackboard snapshot and the iteration
//! count, with no hidden state, so the engine can re-evaluate it safely when
//! an attempt is replayed.

use serde::{Deserialize, Serialize};

use crate::blackboard::Blackboard;

/// Why the agent loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The agent emitted a completion summary.
    SummaryEmitted,
    /// The iteration ceiling was reached without a summary.
    IterationCeiling,
}

/// Routing decision evaluated after every agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterDecision {
    /// Re-invoke the agent for another turn.
    Continue,
    /// Stop the loop.
    Terminate(TerminationReason),
}

/// Decides whether the agent loop continues.
///
/// A non-empty summary terminates the loop. The iteration ceiling terminates
/// it regardless of summary state: with `max_iterations = 15`, iterations
/// `0..15` run and the 16th never fires.
pub fn route(blackboard: &Blackboard, iteration: u32, max_iterations: u32) -> RouterDecision {
    if blackboard.has_summary() {
        return RouterDecision::Terminate(TerminationReason::SummaryEmitted);
    }

    if iteration >= max_iterations {
        return RouterDecision::Terminate(TerminationReason::IterationCeiling);
    }

    RouterDecision::Continue
}
