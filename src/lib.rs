//! Dynamic route table for a reverse-proxy gateway.
//!
//! Routes come from static config and an external store, are merged and
//! published atomically on a schedule, and are resolved per request path.

pub mod admin;
pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod refresh;
pub mod routing;
pub mod source;
pub mod store;

pub use config::GatewayConfig;
pub use lifecycle::{RouteService, Shutdown};
pub use refresh::{RouteHealth, RouteRefresher, TriggerOutcome};
pub use routing::{ResolvedRoute, RouteRecord, RouteResolver, RouteTable, RouteTarget};
pub use source::{RouteSource, StaticRouteSource, StoredRouteSource};
