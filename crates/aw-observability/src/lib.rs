//! # aw-observability
//!
//! Structured logging setup shared by the Azure Warden binaries.

mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
