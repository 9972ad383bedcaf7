//! Logging utilities.
//!
//! Both the UI thread and the VR worker log through the `log` facade; this
//! module only owns backend initialization.

mod init;

pub use init::{init_logging, LoggingConfig};
