//! Persistence backends for stored routes.
//!
//! # Responsibilities
//! - Define the read-all-rows capability the stored source depends on
//! - Provide file and HTTP backends selected by config
//!
//! # Design Decisions
//! - Backends only read rows; decoding and validation happen in the source
//! - Every row field is optional at this layer
//! - Blocking work (file reads, JSON parsing) runs on the blocking pool

pub mod file;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StoreConfig, StoreKind};
use crate::routing::RouteRow;

pub use file::JsonFileRouteStore;
pub use http::HttpRouteStore;

/// Default name of the route table in a store.
pub const DEFAULT_TABLE: &str = "gateway_routes";

/// Errors reading from a route store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("table '{0}' not found")]
    MissingTable(String),

    #[error("unreadable data: {0}")]
    Decode(String),
}

/// `namespace.table`, or `table` when there is no namespace.
pub fn qualified_table(namespace: Option<&str>, table: &str) -> String {
    match namespace {
        Some(ns) => format!("{}.{}", ns, table),
        None => table.to_string(),
    }
}

/// Query capability over the external route table.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Every row of the route table, in store order.
    async fn read_all_route_rows(&self) -> Result<Vec<RouteRow>, StoreError>;
}

/// Build the backend described by config.
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn RouteStore>, StoreError> {
    let namespace = config.namespace.as_deref();
    let store: Arc<dyn RouteStore> = match config.kind {
        StoreKind::File => Arc::new(JsonFileRouteStore::new(
            &config.location,
            qualified_table(namespace, &config.table),
        )),
        StoreKind::Http => Arc::new(HttpRouteStore::with_namespace(
            &config.location,
            namespace,
            &config.table,
        )?),
    };
    Ok(store)
}
