//! # Observability
//!
//! Structured logging for the certificate generator.

pub mod logging;

pub use logging::{init_logging, log_run_config, LoggingOptions};
