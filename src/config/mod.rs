// Configuration module entry point
// Loads layered configuration (file, environment, defaults) and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use hyper::header::HeaderValue;

pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. Environment variables prefixed with `UPLOAD`
    /// override it, using `__` between sections, e.g. `UPLOAD_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("UPLOAD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 120)?
            .set_default("performance.write_timeout", 120)?
            .set_default("http.server_name", "upload-validator")?
            .set_default("http.max_body_size", 134_217_728)? // 128MB
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would break every response at runtime
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        HeaderValue::from_str(&self.http.server_name).map_err(|e| {
            config::ConfigError::Message(format!(
                "Invalid http.server_name {:?}: {e}",
                self.http.server_name
            ))
        })?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
