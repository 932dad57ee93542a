//! Global admission control using a sliding window of grant timestamps
//!
//! Every send call of a run passes through a single [`RateGate`] so the
//! messaging API never sees more than `max_rate` calls in any `window`.
//!
//! # Sliding Window Algorithm
//!
//! - Each granted call records its timestamp
//! - Timestamps older than `window` are pruned on every acquire
//! - If fewer than `max_rate` remain, the call is granted immediately
//! - Otherwise the caller sleeps until the oldest timestamp leaves the window
//!
//! # Example
//!
//! ```text
//! Rate limit: 35 calls per 1s
//! - t=0.000: calls 1..=35 granted
//! - t=0.000: call 36 waits for call 1 to expire (1.000s + guard)
//! - t=1.001: calls 36..=70 granted
//! ```
//!
//! Acquires are serialized: the lock is held while waiting, so callers are
//! granted in arrival order and the window bound holds exactly.

use std::{collections::VecDeque, time::Duration};

use tokio::{sync::Mutex, time::Instant};

/// Extra sleep added to a computed wait so the oldest grant has strictly left
/// the window when we re-check
const GUARD: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct RateGate {
    max_rate: usize,
    window: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    /// Create a gate allowing `max_rate` calls per `window`.
    ///
    /// A `max_rate` of zero is treated as one; callers validate configuration
    /// before building a gate.
    #[must_use]
    pub fn new(max_rate: usize, window: Duration) -> Self {
        let max_rate = max_rate.max(1);
        Self {
            max_rate,
            window,
            grants: Mutex::new(VecDeque::with_capacity(max_rate)),
        }
    }

    #[must_use]
    pub const fn max_rate(&self) -> usize {
        self.max_rate
    }

    /// Wait until one more call fits in the window, then record it.
    pub async fn acquire(&self) {
        let mut grants = self.grants.lock().await;

        loop {
            let now = Instant::now();
            self.prune(&mut grants, now);

            if grants.len() < self.max_rate {
                grants.push_back(now);
                return;
            }

            let Some(&oldest) = grants.front() else {
                continue;
            };
            let wait = oldest
                .checked_add(self.window)
                .map_or(self.window, |expires| expires.saturating_duration_since(now));

            tracing::trace!(
                wait_ms = wait.as_millis(),
                in_window = grants.len(),
                "Rate gate full, waiting"
            );
            tokio::time::sleep(wait.saturating_add(GUARD)).await;
        }
    }

    /// Number of grants currently inside the window
    pub async fn in_window(&self) -> usize {
        let mut grants = self.grants.lock().await;
        self.prune(&mut grants, Instant::now());
        grants.len()
    }

    fn prune(&self, grants: &mut VecDeque<Instant>, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };

        while grants.front().is_some_and(|&granted| granted < cutoff) {
            grants.pop_front();
        }
    }
}
