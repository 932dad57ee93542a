//! Collaborator traits the engine depends on
//!
//! The engine only talks to the outside world through these seams: a
//! [`Transport`] that performs one send and classifies the result, an optional
//! [`ProgressSink`] for periodic snapshots, and an optional [`BlockedSink`] that
//! persists unreachable recipients once the run is over.

use async_trait::async_trait;

use crate::{
    stats::Progress,
    types::{Outcome, Payload, RecipientId},
};

/// Delivers one message to one recipient.
///
/// Implementations must map every failure, including their own I/O errors,
/// onto an [`Outcome`]. They should not panic: a panicking send aborts the run.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, recipient: RecipientId, payload: &Payload) -> Outcome;
}

/// Receives periodic progress snapshots.
///
/// Errors are logged by the engine and otherwise ignored.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, progress: Progress) -> anyhow::Result<()>;
}

/// Persists recipients that can no longer be reached.
///
/// Called at most once per run, after every unit settled, and only when at
/// least one recipient was blocked.
#[async_trait]
pub trait BlockedSink: Send + Sync {
    async fn persist_blocked(&self, recipients: &[RecipientId]) -> anyhow::Result<()>;
}

/// Adapts a synchronous closure into a [`ProgressSink`]
pub struct FnProgress<F>(pub F);

#[async_trait]
impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(Progress) -> anyhow::Result<()> + Send + Sync,
{
    async fn report(&self, progress: Progress) -> anyhow::Result<()> {
        (self.0)(progress)
    }
}
