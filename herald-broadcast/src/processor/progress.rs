//! Periodic progress snapshots

use std::{sync::Arc, time::Duration};

use herald_common::Signal;
use tokio::{sync::broadcast, time::MissedTickBehavior};

use crate::{
    service::ProgressSink,
    stats::{Progress, RunLedger},
};

/// Hand one snapshot to the sink, logging rather than propagating failures
pub(crate) async fn emit(sink: &dyn ProgressSink, progress: Progress) {
    if let Err(e) = sink.report(progress).await {
        tracing::debug!(
            completed = progress.completed,
            total = progress.total,
            error = %e,
            "Progress callback failed"
        );
    }
}

/// Report a snapshot every `interval` until a shutdown signal arrives.
///
/// The first report happens one full interval after start. The final
/// snapshot is emitted by the orchestrator once the run drained.
pub(crate) async fn run_reporter(
    ledger: Arc<RunLedger>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<Signal>,
) {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the first tick to avoid immediate execution
    timer.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = timer.tick() => emit(sink.as_ref(), ledger.snapshot()).await,
        }
    }
}
