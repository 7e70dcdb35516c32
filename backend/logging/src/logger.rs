//! Structured Logger
//!
//! Wraps `tracing` to provide console output plus a daily-rolling NDJSON
//! file, with environment-based level control.

use std::path::{Path, PathBuf};

use memswarm_config::defaults::DEFAULT_LOG_LEVEL;
use memswarm_config::{config_dir, LoggingConfig};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Base name of the rolling log file.
pub const LOG_FILE_NAME: &str = "memswarm.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `level`. Returns `false` when a global subscriber
/// was already installed (the existing one stays in place).
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let dir_display = log_dir.as_ref().display().to_string();

    // Writes `memswarm.log.YYYY-MM-DD` under `log_dir`
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();
    if installed {
        info!(dir = %dir_display, level, "Logger initialized");
    }
    installed
}

/// Resolve directory and level from config, falling back to
/// `<config dir>/logs` and the default level.
pub fn init_from_config(config: Option<&LoggingConfig>) -> bool {
    let dir = config
        .and_then(|c| c.dir.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("logs"));
    let level = config
        .and_then(|c| c.level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logger(dir, level)
}
