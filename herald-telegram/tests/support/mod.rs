//! Shared helpers for Telegram transport integration tests

pub mod mock_api;

pub use mock_api::{MockBotApi, RecordedRequest};
