// Configuration module entry point
// Layered settings: defaults, optional config file, environment

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, DatasetConfig, HttpConfig, LoggingConfig, PerformanceConfig, RoutesConfig,
    ServerConfig,
};

/// Environment variable naming the config file (without extension)
pub const CONFIG_PATH_ENV: &str = "WOF_REVERSE_CONFIG";

/// Plain environment variables honoured on top of every other source
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `PORT`
    pub port: Option<String>,
    /// `PARQUET_PATH`
    pub parquet_path: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok().filter(|v| !v.trim().is_empty()),
            parquet_path: std::env::var("PARQUET_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl Config {
    /// Load configuration from the file named by `WOF_REVERSE_CONFIG`
    /// (default "config", any extension the `config` crate understands)
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config".to_string());
        Self::load_from(&path, &EnvOverrides::from_env())
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest precedence first: defaults, the file (optional),
    /// `GEOCODER__SECTION__KEY` variables, then `overrides`.
    pub fn load_from(
        config_path: &str,
        overrides: &EnvOverrides,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("GEOCODER").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("dataset.path", "data/whosonfirst-data-admin.parquet")?
            .set_default("dataset.install_spatial", true)?
            .set_default(
                "dataset.source_url",
                "https://data.geocode.earth/wof/dist/parquet/whosonfirst-data-admin-latest.parquet",
            )?
            .set_default("dataset.max_age_days", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "wof-reverse")?
            .set_default("http.enable_cors", false)?
            .set_default("routes.health_path", "/health")?
            .set_default("routes.reverse_path", "/reverse")?
            .set_override_option("server.port", overrides.port.clone())?
            .set_override_option("dataset.path", overrides.parquet_path.clone())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
