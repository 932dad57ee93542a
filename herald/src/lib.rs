//! Command-line wiring around the broadcast engine
//!
//! Loads configuration, reads recipient lists and keyboard files, and provides the file-backed
//! and dry-run collaborators used by the `herald` binary.

pub mod config;
pub mod dry_run;
pub mod markup;
pub mod recipients;
pub mod sinks;
