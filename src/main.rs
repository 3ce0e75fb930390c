//! Canvas API Gateway Server
//!
//! Stateless HTTP gateway in front of the Canvas LMS REST API. Serves
//! course, assignment, module, file, announcement, and grade lookups
//! plus cross-course aggregation and study guide generation.

use canvas_gateway::api::{start_server, AppState};
use canvas_gateway::canvas::CanvasClient;
use canvas_gateway::core::Config;
use canvas_gateway::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("canvas-gateway")
        .version(canvas_gateway::VERSION)
        .about("HTTP gateway for the Canvas LMS REST API.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
        )
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging and metrics
    canvas_gateway::init(&config)?;

    info!("Starting Canvas API Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Build the shared upstream client
    let canvas = CanvasClient::new(&config.canvas)?;
    let state = Arc::new(AppState {
        canvas,
        request_timeout: config.server.request_timeout(),
        metrics_enabled: config.metrics.enabled,
    });

    // Run until a shutdown signal arrives
    start_server(config.server.http_addr, state).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| canvas_gateway::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}
