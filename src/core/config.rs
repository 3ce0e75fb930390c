//! Configuration management for the Canvas gateway
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `CG_*` environment variables, then command-line overrides.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "canvas-gateway.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Upstream Canvas API configuration
    pub canvas: CanvasConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Timeout for handling a single client request, in seconds.
    /// Must cover the multi-request fan-out of the aggregation endpoint.
    pub request_timeout_secs: u64,
}

/// Upstream Canvas API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// TCP connect timeout, in seconds
    pub connect_timeout_secs: u64,

    /// Per-request timeout against Canvas, in seconds
    pub request_timeout_secs: u64,

    /// Attempts per upstream request (1 = no retries)
    pub retry_attempts: u32,

    /// Base backoff delay between retries, in milliseconds
    pub retry_base_backoff_ms: u64,

    /// Upper bound on a single backoff delay, in milliseconds
    pub retry_max_backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics on `GET /metrics`
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // The port the original deployment served on
            http_addr: "0.0.0.0:8000".parse().unwrap(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            retry_attempts: 3,
            retry_base_backoff_ms: 250,
            retry_max_backoff_ms: 4_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the default config file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file first
        if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
            config = Self::from_file(DEFAULT_CONFIG_FILE)?;
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("CG_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(secs) = env::var("CG_CANVAS_TIMEOUT_SECS") {
            self.canvas.request_timeout_secs = secs
                .parse()
                .map_err(|e| Error::config(format!("Invalid Canvas timeout: {}", e)))?;
        }

        if let Ok(attempts) = env::var("CG_CANVAS_RETRIES") {
            self.canvas.retry_attempts = attempts
                .parse()
                .map_err(|e| Error::config(format!("Invalid retry attempts: {}", e)))?;
        }

        if let Ok(level) = env::var("CG_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("CG_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(enabled) = env::var("CG_METRICS_ENABLED") {
            self.metrics.enabled = enabled
                .parse()
                .map_err(|e| Error::config(format!("Invalid metrics flag: {}", e)))?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.canvas.connect_timeout_secs == 0 || self.canvas.request_timeout_secs == 0 {
            return Err(Error::config("Canvas timeouts must be non-zero"));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(Error::config("Server request timeout must be non-zero"));
        }

        if self.canvas.retry_attempts == 0 {
            return Err(Error::config("Retry attempts must be at least 1"));
        }

        if self.canvas.retry_attempts > 10 {
            return Err(Error::config("Too many retry attempts (maximum 10)"));
        }

        if self.canvas.retry_base_backoff_ms > self.canvas.retry_max_backoff_ms {
            return Err(Error::config(
                "Base backoff must not exceed maximum backoff",
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

impl ServerConfig {
    /// Client-facing request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CanvasConfig {
    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base backoff delay as a `Duration`
    pub fn retry_base_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_base_backoff_ms)
    }

    /// Maximum backoff delay as a `Duration`
    pub fn retry_max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.server.http_addr.port(), 8000);
        assert_eq!(config.canvas.retry_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:9000\"\n\n[canvas]\nretry_attempts = 5"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.http_addr.port(), 9000);
        assert_eq!(config.canvas.retry_attempts, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.canvas.connect_timeout_secs, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nhttp_addr = oops").unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.canvas.retry_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.canvas.retry_base_backoff_ms = 10_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CG_CANVAS_RETRIES", "7");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        std::env::remove_var("CG_CANVAS_RETRIES");

        assert_eq!(config.canvas.retry_attempts, 7);
    }

    #[test]
    fn test_duration_accessors() {
        let config = Config::default();
        assert_eq!(config.canvas.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.canvas.retry_base_backoff(), Duration::from_millis(250));
    }
}
