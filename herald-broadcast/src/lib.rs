//! Rate-limited broadcast delivery
//!
//! This crate fans a single message out to many recipients through a messaging
//! API that enforces a global throughput ceiling. It provides:
//! - A sliding-window [`RateGate`] shared by all senders of one run
//! - Ready and delayed queues for units waiting on an API-imposed back-off
//! - A worker pool, delay scheduler and progress reporter driven by [`Broadcaster`]
//! - A blocking entry point that owns a private scheduler for the run

mod error;
pub mod policy;
mod processor;
pub mod queue;
mod rate_gate;
mod runtime;
mod service;
mod stats;
mod types;

pub use error::BroadcastError;
pub use policy::{Disposition, RetryPolicy};
pub use processor::{BroadcastConfig, Broadcaster, RunOptions};
pub use rate_gate::RateGate;
pub use runtime::run_blocking;
pub use service::{BlockedSink, FnProgress, ProgressSink, Transport};
pub use stats::{Progress, RunStats};
pub use types::{DeliveryUnit, InlineButton, InlineKeyboard, Outcome, Payload, RecipientId};
