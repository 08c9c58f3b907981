//! Chat gateway (v1)
//!
//! An HTTP gateway that relays chat results as JSON or server-sent events.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ recovery → CORS → security headers → request ID
//!                     → access log → correlation ID
//!                              │
//!                              ▼
//!                     route groups under the API prefix
//!                      ├── dispatch: business fn → JSON envelope
//!                      └── relay: named stream → SSE
//!                              │
//!     Client Response          ▼
//!     ◀────────────── success payload / {"msg": ...} / event frames
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use chat_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use chat_gateway::lifecycle::{shutdown_on_signal, Shutdown};
use chat_gateway::observability::{logging, metrics};
use chat_gateway::{EventsRoutes, HttpServer, StreamManager, SystemRoutes};

#[derive(Parser, Debug)]
#[command(name = "chat-gateway", about = "HTTP gateway for chat completions", disable_version_flag = true)]
struct Cli {
    /// Path to a TOML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,
}

fn load(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load(&cli)?;
    logging::init(&config.logging)?;

    tracing::info!("chat-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address(),
        prefix = %config.server.prefix,
        shutdown_timeout_secs = config.server.shutdown_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let streams = Arc::new(StreamManager::new(config.streams.clone()));
    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)
        .with_streams(streams)
        .with_group(SystemRoutes)
        .with_group(EventsRoutes);
    server.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
