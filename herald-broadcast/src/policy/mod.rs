//! Policy abstractions for delivery decisions.
//!
//! - [`RetryPolicy`]: Maps a send [`Outcome`](crate::Outcome) to what happens to the unit next

pub mod retry;

pub use retry::{Disposition, MAX_RETRY_AFTER, RetryPolicy};
