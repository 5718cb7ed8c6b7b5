//! Gateway route service.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   ┌──────────────┐
//!   │ static routes│   │ route store  │   (file / http)
//!   └──────┬───────┘   └──────┬───────┘
//!          │ fetch            │ fetch (timeout per source)
//!          ▼                  ▼
//!   ┌─────────────────────────────────┐
//!   │ RouteRefresher                  │◀── interval tick / POST /admin/refresh
//!   │  fetch → merge → publish        │
//!   └───────────────┬─────────────────┘
//!                   │ atomic swap
//!                   ▼
//!   ┌─────────────────────────────────┐
//!   │ RouteTable (snapshot)           │
//!   └───────────────┬─────────────────┘
//!                   │ load
//!                   ▼
//!   ┌─────────────────────────────────┐      ┌───────────┐
//!   │ RouteResolver                   │─────▶│ discovery │
//!   └─────────────────────────────────┘      └───────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use gateway_routes::admin::{self, AdminState};
use gateway_routes::config::{load_config, GatewayConfig};
use gateway_routes::lifecycle::{signals, RouteService, Shutdown};
use gateway_routes::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gateway-routes")]
#[command(about = "Dynamic route table service for a reverse-proxy gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gateway-routes starting");

    tracing::info!(
        static_routes = config.routes.len(),
        store_enabled = config.store.enabled,
        refresh_interval_secs = config.refresh.interval_secs,
        fetch_timeout_ms = config.refresh.fetch_timeout_ms,
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

    let service = RouteService::build(&config)?;
    let shutdown = Shutdown::new();

    let (health, scheduler) = service.start(&shutdown).await;
    tracing::info!(health = ?health, "Initial route table published");

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            refresher: service.refresher.clone(),
            resolver: service.resolver.clone(),
            discovery: service.discovery.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let router = admin::setup_admin_router(
            state,
            Duration::from_secs(config.admin.request_timeout_secs),
        );
        Some(tokio::spawn(admin::serve(listener, router, shutdown.subscribe())))
    } else {
        tracing::info!("Admin API disabled");
        None
    };

    signals::shutdown_signal().await;
    shutdown.trigger();

    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "Refresh scheduler task failed");
    }
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API error"),
            Err(e) => tracing::error!(error = %e, "Admin API task failed"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
