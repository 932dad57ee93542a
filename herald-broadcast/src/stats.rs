//! Run accounting: terminal outcomes, drain detection and final statistics

use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;

use crate::types::RecipientId;

/// Snapshot handed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Result of a finished broadcast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub total_messages: usize,
    pub total_sent: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// Sent messages per second over the whole run
    pub avg_speed: f64,
    pub duration_seconds: f64,
    pub blocked_count: usize,
    pub blocked_ids: Vec<RecipientId>,
}

impl RunStats {
    /// Statistics for a run that had nothing to send
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total_messages: 0,
            total_sent: 0,
            success_count: 0,
            failed_count: 0,
            avg_speed: 0.0,
            duration_seconds: 0.0,
            blocked_count: 0,
            blocked_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    sent: usize,
    failed: usize,
    blocked: BTreeSet<RecipientId>,
}

/// Counts terminal outcomes for one run and signals when every unit settled.
///
/// Each unit must be settled exactly once, through one of the `record_*`
/// methods; retries are not recorded.
#[derive(Debug)]
pub(crate) struct RunLedger {
    total: usize,
    tally: Mutex<Tally>,
    outstanding: AtomicUsize,
    drained: Notify,
}

impl RunLedger {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            tally: Mutex::new(Tally::default()),
            outstanding: AtomicUsize::new(total),
            drained: Notify::new(),
        }
    }

    pub(crate) fn record_sent(&self) {
        self.tally.lock().sent += 1;
        self.settle();
    }

    pub(crate) fn record_failed(&self) {
        self.tally.lock().failed += 1;
        self.settle();
    }

    pub(crate) fn record_blocked(&self, recipient: RecipientId) {
        {
            let mut tally = self.tally.lock();
            tally.failed += 1;
            tally.blocked.insert(recipient);
        }
        self.settle();
    }

    fn settle(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_one();
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Resolves once every unit has reached a terminal outcome
    pub(crate) async fn drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn snapshot(&self) -> Progress {
        let tally = self.tally.lock();
        Progress {
            completed: tally.sent + tally.failed,
            total: self.total,
            sent: tally.sent,
            failed: tally.failed,
        }
    }

    pub(crate) fn blocked(&self) -> Vec<RecipientId> {
        self.tally.lock().blocked.iter().copied().collect()
    }

    #[allow(clippy::cast_precision_loss, reason = "Throughput is informational")]
    pub(crate) fn finish(&self, duration: Duration) -> RunStats {
        let tally = self.tally.lock();
        let duration_seconds = duration.as_secs_f64();
        let avg_speed = if duration_seconds > 0.0 {
            tally.sent as f64 / duration_seconds
        } else {
            0.0
        };

        RunStats {
            total_messages: self.total,
            total_sent: tally.sent,
            success_count: tally.sent,
            failed_count: tally.failed,
            avg_speed,
            duration_seconds,
            blocked_count: tally.blocked.len(),
            blocked_ids: tally.blocked.iter().copied().collect(),
        }
    }
}
