// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Boundary dataset configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Local GeoParquet file queried by the service
    pub path: String,
    /// Run `INSTALL spatial` before `LOAD spatial` (needs network on first use)
    pub install_spatial: bool,
    /// Remote file fetched by the refresher
    pub source_url: String,
    /// Age in days after which the refresher checks the remote again
    pub max_age_days: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, `RUST_LOG` takes precedence
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Liveness probe path
    pub health_path: String,
    /// Reverse geocode endpoint path
    pub reverse_path: String,
}
