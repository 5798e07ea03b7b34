//! Sample service record the inspector binds sources onto.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata::Bind;

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Bind, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name.
    pub name: String,
    /// Port to listen on.
    pub listen_port: u16,
    /// Enable debug behavior.
    pub debug: bool,
    /// CORS origins.
    pub allowed_origins: Vec<String>,
    /// Upper bound for one request.
    #[serde(with = "strata::duration::as_str")]
    pub request_timeout: Duration,
    /// Database settings.
    #[bind(nested)]
    pub database: DatabaseConfig,
    /// Telemetry settings.
    #[bind(nested)]
    pub telemetry: TelemetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            listen_port: 8080,
            debug: false,
            allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
            database: DatabaseConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Bind, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, read from `DATABASE_URL` regardless of prefix.
    #[bind(env = "DATABASE_URL")]
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/service".to_string(),
            pool_size: 10,
        }
    }
}

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq, Bind, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint.
    pub otlp_endpoint: Option<String>,
    /// Trace sampling ratio.
    pub sampling_ratio: f64,
    /// Log level.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            sampling_ratio: 1.0,
            log_level: "info".to_string(),
        }
    }
}
