use matcher::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose Prometheus metrics on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

/// Full service configuration: the `server` and `pipeline` sections.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load from an optional `medsearch.{toml,yaml,json,...}` file in the
    /// working directory, overridden by `MEDSEARCH__SECTION__KEY` environment
    /// variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("medsearch").required(false))
            .add_source(config::Environment::with_prefix("MEDSEARCH").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load from an explicit file with no environment overrides.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Ok(builder.build()?.try_deserialize()?)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
