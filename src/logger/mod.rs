//! Logger module
//!
//! Provides logging utilities for the service including:
//! - Subscriber setup (`tracing-subscriber` with an env filter)
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Target used for access log lines, filterable with `RUST_LOG=access=off`
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `logging.level`. Should be called once at startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, column_count: usize) {
    tracing::info!("======================================");
    tracing::info!("Server running on port {}", addr.port());
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Using parquet file: {}", config.dataset.path);
    tracing::info!("Whitelisted columns: {column_count}");
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(max) = config.performance.max_connections {
        tracing::info!("Max connections: {max}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_shutdown(signal: &str) {
    tracing::info!("{signal} received, no longer accepting connections");
}
