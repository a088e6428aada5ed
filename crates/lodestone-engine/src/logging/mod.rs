//! Logging utilities.
//!
//! Centralizes logger initialization on top of the `log` facade. Output goes to
//! stderr, or is appended to a session log file when one is configured.

mod init;

pub use init::{init_logging, LoggingConfig};
