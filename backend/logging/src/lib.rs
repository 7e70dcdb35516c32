//! Structured logging setup for memswarm.

pub mod logger;

pub use logger::{init_from_config, init_logger, LOG_FILE_NAME};
