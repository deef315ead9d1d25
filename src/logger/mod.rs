//! Logger module
//!
//! Installs the `tracing` subscriber and provides the server's lifecycle
//! and access logging helpers:
//! - Server lifecycle logging
//! - Access logging in combined, common or json format
//! - Optional file output instead of stderr

mod format;

pub use format::AccessLogEntry;

use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};
use crate::error::StartupError;

/// Target used for access log lines, filterable with `RUST_LOG=access=off`
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes
/// precedence over `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), StartupError> {
    let filter = build_filter(&config.level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match config.log_file.as_deref() {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| StartupError::Subscriber(e.to_string()))
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> Result<File, StartupError> {
    let open = || -> std::io::Result<File> {
        // Create parent directories if they don't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)
    };

    open().map_err(|source| StartupError::LogFile {
        path: path.to_string(),
        source,
    })
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("product store listening on http://{addr}{}", config.routes.product_path);
    tracing::info!(
        level = %config.logging.level,
        access_log = config.logging.access_log,
        max_body_size = config.http.max_body_size,
        max_connections = ?config.performance.max_connections,
        "configuration loaded"
    );
    if let Some(workers) = config.server.workers {
        tracing::info!("worker threads: {workers}");
    } else {
        tracing::info!("worker threads: default (CPU cores)");
    }
    if let Some(ref path) = config.logging.log_file {
        tracing::info!("log file: {path}");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("failed to serve connection: {err:?}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = std::env::temp_dir().join(format!("product-store-log-{}", std::process::id()));
        let path = dir.join("nested").join("server.log");
        let path_str = path.to_string_lossy().to_string();

        open_log_file(&path_str).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_filter_falls_back_on_bad_level() {
        // Must not panic on an unparsable directive
        let _ = build_filter("[[[not a filter");
    }
}
