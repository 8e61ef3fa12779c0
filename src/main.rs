//! API Gateway
//!
//! Single entry point in front of the tenant, auth, CRM, document and
//! library services.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   API GATEWAY                    │
//!                         │                                                  │
//!   Client Request        │  ┌──────────┐   ┌───────────┐   ┌────────────┐   │
//!   ──────────────────────┼─▶│  http    │──▶│ security  │──▶│  routing   │   │
//!                         │  │  server  │   │ auth gate │   │  resolver  │   │
//!                         │  └──────────┘   └───────────┘   └─────┬──────┘   │
//!                         │                                       │          │
//!                         │                                       ▼          │
//!   Client Response       │  ┌──────────┐                   ┌────────────┐   │
//!   ◀─────────────────────┼──│ response │◀──────────────────│ forwarder  │◀──┼── Backend
//!                         │  └──────────┘                   │ (pooled)   │   │   Service
//!                         │                                 └────────────┘   │
//!                         │  ┌────────────────────────────────────────────┐  │
//!                         │  │ config · health · observability · admin    │  │
//!                         │  │ lifecycle (startup / signals / shutdown)   │  │
//!                         │  └────────────────────────────────────────────┘  │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::loader::load_config_or_default;
use api_gateway::lifecycle::signals::shutdown_signal;
use api_gateway::observability::{logging, metrics};
use api_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "API gateway for the backend services", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config_or_default(&args.config)?;
    logging::init(&config.observability);

    tracing::info!(version = %config.gateway.version, "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        legacy_routes = config.legacy_routes.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
