//! Canvas API Gateway
//!
//! A stateless HTTP gateway in front of the Canvas LMS REST API. Clients
//! pass their institution URL and API token with each request; the gateway
//! proxies to Canvas, aggregates cross-course views such as missing
//! assignments, and wraps every answer in a uniform response envelope.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod api;
pub mod canvas;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{CanvasError, Config, Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize the gateway runtime with tracing and metrics.
///
/// `RUST_LOG` takes precedence over the configured log level so operators
/// can raise verbosity without touching configuration files.
pub fn init(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    // Initialize metrics registry and the uptime clock
    system::metrics::init_registry();
    system::mark_started();

    Ok(())
}
