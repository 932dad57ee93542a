//! Send loop run by each worker of the pool

use std::sync::Arc;

use herald_common::{Signal, outgoing};
use tokio::{sync::broadcast, time::Instant};

use crate::{
    policy::{Disposition, RetryPolicy},
    queue::{DelayQueue, WorkQueue},
    rate_gate::RateGate,
    service::Transport,
    stats::RunLedger,
    types::DeliveryUnit,
};

/// Everything a worker needs, shared by the whole pool of one run
pub(crate) struct WorkerContext {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) gate: Arc<RateGate>,
    pub(crate) work: Arc<WorkQueue>,
    pub(crate) delayed: Arc<DelayQueue>,
    pub(crate) ledger: Arc<RunLedger>,
    pub(crate) policy: RetryPolicy,
}

impl WorkerContext {
    /// Make one send attempt for `unit` and route it by outcome
    async fn deliver(&self, mut unit: DeliveryUnit) {
        self.gate.acquire().await;

        let outcome = self.transport.send(unit.recipient, &unit.payload).await;

        match self.policy.disposition(unit.attempts, outcome) {
            Disposition::Delivered => {
                outgoing!("Delivered to {}", unit.recipient);
                self.ledger.record_sent();
            }
            Disposition::Retry { after } => {
                unit.defer(after);
                tracing::warn!(
                    recipient = %unit.recipient,
                    attempt = unit.attempts,
                    retry_after_secs = after.as_secs_f64(),
                    "Flood control, deferring retry"
                );
                self.delayed.push(unit, Instant::now());
            }
            Disposition::Exhausted => {
                tracing::error!(
                    recipient = %unit.recipient,
                    attempts = unit.attempts + 1,
                    "Retry limit reached, giving up"
                );
                self.ledger.record_failed();
            }
            Disposition::Blocked => {
                tracing::warn!(recipient = %unit.recipient, "Recipient unreachable, marking blocked");
                self.ledger.record_blocked(unit.recipient);
            }
            Disposition::Failed { detail } => {
                tracing::warn!(recipient = %unit.recipient, error = %detail, "Send failed");
                self.ledger.record_failed();
            }
        }
    }
}

/// Pull units until a shutdown signal arrives.
///
/// The signal is only observed between units, so a send in flight always
/// completes and is accounted for.
pub(crate) async fn run_worker(
    id: usize,
    context: Arc<WorkerContext>,
    mut shutdown: broadcast::Receiver<Signal>,
) {
    tracing::trace!(worker = id, "Worker started");

    loop {
        let unit = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            unit = context.work.pop() => unit,
        };

        context.deliver(unit).await;
    }

    tracing::trace!(worker = id, "Worker stopped");
}
