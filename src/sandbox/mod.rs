//! Sandbox module for ephemeral compute environments.
//!
//! This module provides the [`SandboxProvider`] trait for provisioning
//! sandboxes and the [`LocalSandboxProvider`] implementation backed by
//! scratch directories on the local machine.

mod local;
mod provider;

pub use local::{LocalSandbox, LocalSandboxProvider};
pub use provider::{CommandOutput, Sandbox, SandboxProvider};
