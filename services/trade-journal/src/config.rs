//! Configuration for the trade journal service

use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::errors::JournalResult;

/// Trade journal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Trade store configuration
    pub store: StoreConfig,
    /// Exchange price feed configuration
    pub price_feed: PriceFeedConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum request body size in bytes (trade images are inline)
    pub max_body_size: usize,
    /// Enable compression
    pub compression: bool,
}

/// Which store backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Trade store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Connection string, required for postgres
    pub database_url: Option<String>,
    /// Pool size for postgres
    pub max_connections: u32,
}

/// Exchange price feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceFeedConfig {
    /// Run the background refresh task
    pub enabled: bool,
    /// Exchange REST base URL
    pub base_url: String,
    /// Seconds between refreshes
    pub refresh_interval_seconds: u64,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Pairs served by the popular-pairs endpoint
    pub pairs: Vec<String>,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Max age for preflight requests
    pub max_age_seconds: u64,
}

/// Monitoring and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Install the Prometheus recorder
    pub metrics_enabled: bool,
    /// Metrics endpoint path
    pub metrics_path: String,
    /// Health check endpoint path
    pub health_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            compression: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.mexc.com".to_string(),
            refresh_interval_seconds: 30,
            request_timeout_seconds: 10,
            pairs: [
                "BTC/USDT", "ETH/USDT", "BNB/USDT", "ADA/USDT", "SOL/USDT", "MATIC/USDT",
                "DOT/USDT", "AVAX/USDT",
            ]
            .iter()
            .map(|p| (*p).to_string())
            .collect(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Authorization".to_string(),
                "Content-Type".to_string(),
                "X-Requested-With".to_string(),
            ],
            allow_credentials: true,
            max_age_seconds: 86400, // 24 hours
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
            health_path: "/health".to_string(),
        }
    }
}

impl JournalConfig {
    /// Load configuration from an optional file layered under `JOURNAL__*`
    /// environment variables
    pub fn load(path: &str) -> JournalResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(false))
            .add_source(
                config::Environment::with_prefix("JOURNAL")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("price_feed.pairs"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get server address
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PriceFeedConfig {
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
