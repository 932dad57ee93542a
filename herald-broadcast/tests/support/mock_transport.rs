//! Scripted transport and recording sinks for exercising the engine
//!
//! The transport answers each recipient from a per-recipient script of
//! outcomes, falling back to [`Outcome::Success`] once the script runs out,
//! and records the virtual time of every call.
#![allow(dead_code)] // Test utility module - not all methods used in every test
//!
//! # Example
//!
//! ```rust,no_run
//! let transport = MockTransport::builder()
//!     .script(RecipientId(1), [Outcome::RecipientUnreachable])
//!     .build();
//! ```

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use herald_broadcast::{
    BlockedSink, Outcome, Payload, Progress, ProgressSink, RecipientId, Transport,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One call observed by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub recipient: RecipientId,
    pub at: Instant,
}

#[derive(Default)]
pub struct MockTransportBuilder {
    scripts: HashMap<RecipientId, Vec<Outcome>>,
    fallback: Option<Outcome>,
    panic_on: Option<RecipientId>,
    latency: Duration,
}

impl MockTransportBuilder {
    /// Answer successive sends to `recipient` with `outcomes`, in order
    #[must_use]
    pub fn script(mut self, recipient: RecipientId, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.scripts
            .entry(recipient)
            .or_default()
            .extend(outcomes);
        self
    }

    /// Outcome for sends with no scripted answer left
    #[must_use]
    pub fn fallback(mut self, outcome: Outcome) -> Self {
        self.fallback = Some(outcome);
        self
    }

    #[must_use]
    pub const fn panic_on(mut self, recipient: RecipientId) -> Self {
        self.panic_on = Some(recipient);
        self
    }

    /// Time each send takes before answering
    #[must_use]
    pub const fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            scripts: Mutex::new(
                self.scripts
                    .into_iter()
                    .map(|(recipient, outcomes)| (recipient, outcomes.into_iter().rev().collect()))
                    .collect(),
            ),
            fallback: self.fallback.unwrap_or(Outcome::Success),
            panic_on: self.panic_on,
            latency: self.latency,
            calls: Mutex::new(Vec::new()),
        })
    }
}

pub struct MockTransport {
    /// Remaining outcomes per recipient, stored reversed so `pop` yields the next
    scripts: Mutex<HashMap<RecipientId, Vec<Outcome>>>,
    fallback: Outcome,
    panic_on: Option<RecipientId>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    #[must_use]
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn calls_to(&self, recipient: RecipientId) -> Vec<Instant> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.recipient == recipient)
            .map(|call| call.at)
            .collect()
    }

    /// Largest number of calls that fell inside any span of `window`
    #[must_use]
    pub fn max_calls_within(&self, window: Duration) -> usize {
        let mut times: Vec<Instant> = self.calls.lock().iter().map(|call| call.at).collect();
        times.sort();

        let mut max = 0;
        let mut start = 0;
        for end in 0..times.len() {
            while times[end].duration_since(times[start]) >= window {
                start += 1;
            }
            max = max.max(end - start + 1);
        }
        max
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, recipient: RecipientId, _payload: &Payload) -> Outcome {
        self.calls.lock().push(Call {
            recipient,
            at: Instant::now(),
        });

        assert!(
            self.panic_on != Some(recipient),
            "transport exploded for {recipient}"
        );

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.scripts
            .lock()
            .get_mut(&recipient)
            .and_then(Vec::pop)
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Keeps every progress snapshot it receives
#[derive(Default)]
pub struct RecordingProgress {
    seen: Mutex<Vec<Progress>>,
}

impl RecordingProgress {
    #[must_use]
    pub fn seen(&self) -> Vec<Progress> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgress {
    async fn report(&self, progress: Progress) -> anyhow::Result<()> {
        self.seen.lock().push(progress);
        Ok(())
    }
}

/// Keeps every batch of blocked recipients it is asked to persist
#[derive(Default)]
pub struct RecordingBlockedSink {
    batches: Mutex<Vec<Vec<RecipientId>>>,
}

impl RecordingBlockedSink {
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<RecipientId>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl BlockedSink for RecordingBlockedSink {
    async fn persist_blocked(&self, recipients: &[RecipientId]) -> anyhow::Result<()> {
        self.batches.lock().push(recipients.to_vec());
        Ok(())
    }
}

/// Rejects everything handed to it
#[derive(Default)]
pub struct FailingSink;

#[async_trait]
impl ProgressSink for FailingSink {
    async fn report(&self, _progress: Progress) -> anyhow::Result<()> {
        anyhow::bail!("progress consumer unavailable")
    }
}

#[async_trait]
impl BlockedSink for FailingSink {
    async fn persist_blocked(&self, _recipients: &[RecipientId]) -> anyhow::Result<()> {
        anyhow::bail!("blocked store unavailable")
    }
}
