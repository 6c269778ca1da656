//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to
//! %APPDATA%\AdvancedLauncher\plugin.log and automatic rotation on plugin
//! startup keeping 10 historical files.

use crate::error::Result;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Maximum number of historical log files to keep (plugin.log.1 through plugin.log.9)
const MAX_LOG_FILES: u8 = 9;

/// Initialize the logging system
///
/// Log level defaults to INFO but can be configured via `RUST_LOG` environment variable.
/// Rotates existing logs on startup to maintain a history of the last 10 sessions.
pub fn init_logging() -> Result<()> {
    let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
    let log_dir = PathBuf::from(appdata).join("AdvancedLauncher");
    std::fs::create_dir_all(&log_dir)?;

    // Rotate existing log files on startup
    let log_path = log_dir.join("plugin.log");
    rotate_logs_on_startup(&log_path)?;

    // tracing_appender's RollingFileAppender doesn't support startup-based
    // rotation with our retention policy, so rotation is handled manually above
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("plugin")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| crate::error::LauncherError::Logging(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| crate::error::LauncherError::Logging(Box::new(e)))?;

    tracing::info!("AdvancedLauncher v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Rotate log files on plugin startup
///
/// Rotates existing logs to maintain a history of the last 10 sessions:
/// - plugin.log.9 is deleted (oldest log)
/// - plugin.log.8 -> plugin.log.9
/// - ... (and so on)
/// - plugin.log.1 -> plugin.log.2
/// - plugin.log -> plugin.log.1
/// - A fresh plugin.log will be created by the logger
///
/// Called unconditionally on every startup regardless of log file size, so
/// each session's logs are preserved separately.
fn rotate_logs_on_startup(log_path: &PathBuf) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path.parent().ok_or_else(|| {
        crate::error::LauncherError::Logging(crate::error::StringError::new("Invalid log path"))
    })?;

    let log_name = log_path
        .file_name()
        .ok_or_else(|| {
            crate::error::LauncherError::Logging(crate::error::StringError::new(
                "Invalid log filename",
            ))
        })?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    // plugin.log.8 -> plugin.log.9, ..., plugin.log.1 -> plugin.log.2
    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        let next_log = log_dir.join(format!("{log_name}.{}", i + 1));

        if current_log.exists() {
            std::fs::rename(&current_log, &next_log)?;
        }
    }

    let log_1 = log_dir.join(format!("{log_name}.1"));
    std::fs::rename(log_path, &log_1)?;

    Ok(())
}
