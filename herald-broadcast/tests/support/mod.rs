//! Shared helpers for broadcast integration tests

pub mod mock_transport;

pub use mock_transport::{FailingSink, MockTransport, RecordingBlockedSink, RecordingProgress};
