//! Typed errors for starting and supervising a broadcast run.
//!
//! Per-recipient failures are never errors here: they are classified into an
//! [`Outcome`](crate::Outcome) and counted in the run statistics. Only problems
//! that stop the run from starting, or from finishing, surface to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The private scheduler for a blocking run could not be built.
    #[error("Failed to start broadcast runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A worker task panicked, so the units it held can no longer settle.
    #[error("Broadcast worker failed: {0}")]
    WorkerFailed(String),
}

impl BroadcastError {
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
