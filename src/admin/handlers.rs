use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::discovery::Endpoint;
use crate::refresh::{RefreshStatus, TriggerOutcome};
use crate::routing::{ResolvedRoute, RouteRecord, Upstream};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub discovered_services: usize,
    #[serde(flatten)]
    pub refresh: RefreshStatus,
}

#[derive(Serialize)]
pub struct RouteList {
    pub generation: u64,
    pub routes: Vec<RouteRecord>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub outcome: TriggerOutcome,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Deserialize)]
pub struct RoutesQuery {
    /// Exact route pattern, e.g. `/api/**`.
    pub pattern: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    /// `host:port`
    pub endpoint: String,
}

#[derive(Serialize)]
pub struct DiscoveryList {
    pub service_count: usize,
    pub services: BTreeMap<String, Vec<Endpoint>>,
}

#[derive(Serialize)]
pub struct DeregisterResponse {
    pub removed: bool,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub route: ResolvedRoute,
    pub upstream: Option<Upstream>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        discovered_services: state.discovery.service_count(),
        refresh: state.refresher.status(),
    })
}

/// Whole table in order, or the single route registered under `?pattern=`.
pub async fn get_routes(
    State(state): State<AdminState>,
    Query(query): Query<RoutesQuery>,
) -> Response {
    let snapshot = state.refresher.table().snapshot();
    let routes = match &query.pattern {
        None => snapshot.records().map(|r| (**r).clone()).collect(),
        Some(pattern) => match snapshot.get(pattern) {
            Some(entry) => vec![(*entry.record).clone()],
            None => return not_found("no route with this pattern", pattern),
        },
    };
    Json(RouteList {
        generation: snapshot.generation(),
        routes,
    })
    .into_response()
}

pub async fn post_refresh(State(state): State<AdminState>) -> Response {
    let outcome = state.refresher.refresh_now();
    let status = match outcome {
        TriggerOutcome::Accepted => StatusCode::ACCEPTED,
        TriggerOutcome::Rejected => StatusCode::CONFLICT,
    };
    (status, Json(RefreshResponse { outcome })).into_response()
}

pub async fn cancel_refresh(State(state): State<AdminState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.refresher.cancel_pending(),
    })
}

pub async fn get_resolve(
    State(state): State<AdminState>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    match state.resolver.resolve(&query.path) {
        Some(route) => {
            let upstream = state.resolver.upstream(&route);
            Json(ResolveResponse { route, upstream }).into_response()
        }
        None => not_found("no matching route", &query.path),
    }
}

pub async fn get_discovery(State(state): State<AdminState>) -> Json<DiscoveryList> {
    Json(DiscoveryList {
        service_count: state.discovery.service_count(),
        services: state.discovery.services(),
    })
}

pub async fn register_endpoint(
    State(state): State<AdminState>,
    Path(service_id): Path<String>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    match body.endpoint.parse::<Endpoint>() {
        Ok(endpoint) => {
            tracing::info!(service = %service_id, endpoint = %endpoint, "Registered endpoint");
            state.discovery.register(&service_id, endpoint);
            StatusCode::CREATED.into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn deregister_endpoint(
    State(state): State<AdminState>,
    Path((service_id, endpoint)): Path<(String, String)>,
) -> Response {
    let Ok(endpoint) = endpoint.parse::<Endpoint>() else {
        return not_found("unknown endpoint", &endpoint);
    };
    let removed = state.discovery.deregister(&service_id, &endpoint);
    if removed {
        tracing::info!(service = %service_id, endpoint = %endpoint, "Deregistered endpoint");
    }
    Json(DeregisterResponse { removed }).into_response()
}

fn not_found(error: &str, path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": error, "path": path })),
    )
        .into_response()
}
