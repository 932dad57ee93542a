//! Telegram Bot API transport
//!
//! Implements [`herald_broadcast::Transport`] on top of the `sendMessage` and
//! `sendPhoto` methods. Every reply, including HTTP and decoding failures, is
//! classified into an [`Outcome`](herald_broadcast::Outcome) here so the engine
//! never sees Telegram-specific errors.

mod api;
mod config;
mod error;
mod transport;

pub use api::{ApiResponse, ResponseParameters, classify};
pub use config::TelegramConfig;
pub use error::TelegramError;
pub use transport::TelegramTransport;
