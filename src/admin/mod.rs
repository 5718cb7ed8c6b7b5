//! Admin API.
//!
//! # Endpoints
//! - `GET /admin/status`: refresher state, health, last cycle
//! - `GET /admin/routes`: published table in order; `?pattern=/x/**` for one route
//! - `POST /admin/refresh`: queue a refresh (202) or report one already queued (409)
//! - `DELETE /admin/refresh`: cancel a queued refresh that has not started
//! - `GET /admin/resolve?path=/x`: resolve a path and locate its upstream
//! - `GET /admin/discovery`: registered services and endpoints
//! - `POST /admin/discovery/{service}`: register `{"endpoint": "host:port"}`
//! - `DELETE /admin/discovery/{service}/{endpoint}`: deregister one endpoint

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::discovery::StaticDiscovery;
use crate::refresh::RouteRefresher;
use crate::routing::RouteResolver;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub refresher: Arc<RouteRefresher>,
    pub resolver: RouteResolver,
    pub discovery: Arc<StaticDiscovery>,
    pub api_key: Arc<str>,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/refresh", post(post_refresh).delete(cancel_refresh))
        .route("/admin/resolve", get(get_resolve))
        .route("/admin/discovery", get(get_discovery))
        .route("/admin/discovery/{service_id}", post(register_endpoint))
        .route("/admin/discovery/{service_id}/{endpoint}", delete(deregister_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin router until shutdown.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
