pub mod config;
pub mod logging;

pub use tracing;

/// Broadcast to long-running tasks when they should wind down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
