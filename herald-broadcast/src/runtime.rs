//! Blocking entry point for callers outside an async context

use herald_common::internal;

use crate::{
    error::BroadcastError,
    processor::{Broadcaster, RunOptions},
    stats::RunStats,
    types::{Payload, RecipientId},
};

/// Run a broadcast to completion on a private single-threaded scheduler.
///
/// Intended for a dedicated thread so a long broadcast does not stall the
/// caller's own event loop. Each call builds and tears down its own runtime,
/// and with it the run's rate gate.
///
/// Must not be called from within an async task: use
/// [`Broadcaster::broadcast`] there.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built, or any error of
/// [`Broadcaster::broadcast`].
pub fn run_blocking(
    broadcaster: &Broadcaster,
    recipients: Vec<RecipientId>,
    payload: Payload,
    options: RunOptions,
) -> Result<RunStats, BroadcastError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("herald-broadcast")
        .build()?;

    internal!("Running broadcast on a private scheduler");
    runtime.block_on(broadcaster.broadcast(recipients, payload, options))
}
