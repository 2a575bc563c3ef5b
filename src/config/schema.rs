//! Configuration schema definitions.
//!
//! Every section carries defaults so an empty file (or no file at all) yields
//! a working configuration against the public Polygonscan endpoint.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::{GEOD_CONTRACT_ADDRESS, POLYGONSCAN_API_URL};

/// Root configuration for the balance sensor service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Explorer API settings.
    pub polygonscan: PolygonscanConfig,

    /// Poll cadence.
    pub polling: PollingConfig,

    /// Where configured entries are persisted.
    pub store: StoreConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Read-only sensor status API.
    pub api: ApiConfig,
}

/// Polygonscan API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolygonscanConfig {
    /// Base URL of the balance query endpoint.
    pub api_url: String,

    /// Token contract whose balance is tracked.
    pub contract_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PolygonscanConfig {
    fn default() -> Self {
        Self {
            api_url: POLYGONSCAN_API_URL.to_string(),
            contract_address: GEOD_CONTRACT_ADDRESS.to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between balance refreshes.
    pub update_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 3600,
        }
    }
}

/// Entry store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON file holding configured entries.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "geod_entries.json".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Serve sensor states over HTTP.
    pub enabled: bool,

    /// Bind address for the status API.
    pub bind_address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8123".to_string(),
        }
    }
}
