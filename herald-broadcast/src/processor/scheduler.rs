//! Moves deferred units back onto the work queue once their back-off elapsed

use std::sync::Arc;

use herald_common::{Signal, internal};
use tokio::{sync::broadcast, time::Instant};

use crate::queue::{DelayQueue, WorkQueue};

/// Requeue matured units until a shutdown signal arrives.
///
/// Sleeps until the earliest release time, or until a new unit is deferred,
/// whichever comes first.
pub(crate) async fn run_scheduler(
    delayed: Arc<DelayQueue>,
    work: Arc<WorkQueue>,
    mut shutdown: broadcast::Receiver<Signal>,
) {
    internal!("Delay scheduler started");

    loop {
        let changed = delayed.changed();

        for mut unit in delayed.pop_due(Instant::now()) {
            unit.pending_delay = None;
            tracing::debug!(
                recipient = %unit.recipient,
                attempt = unit.attempts,
                "Back-off elapsed, requeueing"
            );
            work.push(unit);
        }

        let next_release = delayed.next_release();
        let deadline = next_release.unwrap_or_else(Instant::now);

        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            () = changed => {}
            () = tokio::time::sleep_until(deadline), if next_release.is_some() => {}
        }
    }

    if !delayed.is_empty() {
        tracing::warn!(
            remaining = delayed.len(),
            "Delay scheduler stopped with deferred units outstanding"
        );
    }

    internal!("Delay scheduler stopped");
}
