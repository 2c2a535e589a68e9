//! Tracing subscriber setup for embedding applications.
//!
//! The engine itself only emits `tracing` events; the process that hosts it
//! decides where they go. This helper installs a sensible default subscriber.

use tracing_subscriber::EnvFilter;

/// Initializes a global fmt subscriber with env-filter support.
///
/// Defaults to `INFO` when `RUST_LOG` is unset. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
