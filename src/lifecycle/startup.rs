//! Startup orchestration.
//!
//! # Responsibilities
//! - Build sources in merge order: static defaults, then the store
//! - Wire table, refresher, discovery and resolver together
//! - Run the first refresh cycle before traffic is served
//! - Start the background scheduler
//!
//! # Design Decisions
//! - Bad static routes or store settings are fatal; an unreachable store is not
//! - Every collaborator is passed in explicitly, nothing global

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::discovery::StaticDiscovery;
use crate::lifecycle::Shutdown;
use crate::refresh::{RefreshScheduler, RouteHealth, RouteRefresher};
use crate::routing::{MalformedRecord, RouteResolver, RouteTable};
use crate::source::{StaticRouteSource, StoredRouteSource};
use crate::store::{self, StoreError};

/// Origin name of the static default routes.
pub const STATIC_ORIGIN: &str = "static";
/// Origin name of the external store.
pub const STORE_ORIGIN: &str = "store";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid static route: {0}")]
    StaticRoutes(#[from] MalformedRecord),

    #[error("route store: {0}")]
    Store(#[from] StoreError),
}

/// The assembled route service.
pub struct RouteService {
    pub table: Arc<RouteTable>,
    pub refresher: Arc<RouteRefresher>,
    pub resolver: RouteResolver,
    pub discovery: Arc<StaticDiscovery>,
    refresh_interval: Duration,
}

impl RouteService {
    /// Build every component from a validated config.
    pub fn build(config: &GatewayConfig) -> Result<Self, StartupError> {
        let table = Arc::new(RouteTable::new());
        let default_timeout = config.refresh.fetch_timeout();

        let static_source = StaticRouteSource::from_rows(STATIC_ORIGIN, &config.routes)?;
        tracing::info!(routes = static_source.len(), "Loaded static routes");

        let mut refresher =
            RouteRefresher::new(table.clone()).register(Arc::new(static_source), default_timeout);

        if config.store.enabled {
            let backend = store::from_config(&config.store)?;
            let timeout = config
                .store
                .fetch_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default_timeout);
            tracing::info!(
                kind = ?config.store.kind,
                location = %config.store.location,
                namespace = ?config.store.namespace,
                table = %config.store.table,
                "Route store enabled"
            );
            refresher = refresher.register(Arc::new(StoredRouteSource::new(STORE_ORIGIN, backend)), timeout);
        }

        let discovery = Arc::new(StaticDiscovery::from_config(&config.discovery.services));
        let resolver = RouteResolver::with_config(table.clone(), discovery.clone(), &config.resolver);

        Ok(Self {
            table,
            refresher: Arc::new(refresher),
            resolver,
            discovery,
            refresh_interval: config.refresh.interval(),
        })
    }

    /// Run the first cycle, then hand refreshing to the scheduler.
    pub async fn start(&self, shutdown: &Shutdown) -> (RouteHealth, JoinHandle<()>) {
        if let Err(e) = self.refresher.refresh().await {
            tracing::error!(error = %e, "Initial route refresh failed; serving no routes until a source recovers");
        }
        let health = self.refresher.health();

        let scheduler = RefreshScheduler::new(self.refresher.clone(), self.refresh_interval);
        let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));
        (health, handle)
    }
}
