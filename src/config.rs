//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    #[serde(alias = "PRETTY")]
    #[strum(serialize = "pretty", serialize = "PRETTY")]
    Pretty,
    /// One JSON object per line.
    #[serde(alias = "JSON")]
    #[strum(serialize = "json", serialize = "JSON")]
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Data Store ===
    /// DynamoDB table holding the dataset.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// AWS region of the table.
    #[serde(default = "default_region")]
    pub aws_region: String,

    /// Endpoint override, e.g. a local DynamoDB.
    #[serde(default)]
    pub dynamodb_endpoint: Option<String>,

    /// Deadline applied to every store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    // === Server Configuration ===
    /// Path prefix of all dataset routes (no slashes).
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// HTTP listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Mount the Prometheus `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    // === Access Logging ===
    /// Service tag attached to every access event.
    #[serde(default = "default_log_tag")]
    pub log_tag: String,

    /// Capacity of the bounded access-event queue.
    #[serde(default = "default_queue_capacity")]
    pub log_queue_capacity: usize,

    /// Loggly customer token; remote forwarding is disabled when unset.
    #[serde(default)]
    pub loggly_token: Option<String>,

    /// Loggly bulk/input endpoint base.
    #[serde(default = "default_loggly_url")]
    pub loggly_url: String,

    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_table_name() -> String {
    "akc-citybikes".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_store_timeout() -> u64 {
    10_000
}

fn default_route_prefix() -> String {
    "akc".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_log_tag() -> String {
    "server".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_loggly_url() -> String {
    "https://logs-01.loggly.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            aws_region: default_region(),
            dynamodb_endpoint: None,
            store_timeout_ms: default_store_timeout(),
            route_prefix: default_route_prefix(),
            port: default_port(),
            metrics_enabled: default_true(),
            log_tag: default_log_tag(),
            log_queue_capacity: default_queue_capacity(),
            loggly_token: None,
            loggly_url: default_loggly_url(),
            log_format: LogFormat::default(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.table_name.trim().is_empty() {
            return Err("TABLE_NAME must not be empty".to_string());
        }

        if self.route_prefix.is_empty() || self.route_prefix.contains('/') {
            return Err("ROUTE_PREFIX must be a single non-empty path segment".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.log_queue_capacity == 0 {
            return Err("LOG_QUEUE_CAPACITY must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Per-request store deadline.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Check if access events are forwarded to Loggly.
    pub fn remote_logging_enabled(&self) -> bool {
        self.loggly_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}
