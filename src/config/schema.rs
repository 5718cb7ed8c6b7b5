//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the route service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::routing::RouteRow;
use crate::store::DEFAULT_TABLE;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Refresh schedule and per-source limits.
    pub refresh: RefreshConfig,

    /// Global prefix and ignored paths.
    pub resolver: ResolverConfig,

    /// Static default routes, registered before the store.
    pub routes: Vec<RouteRow>,

    /// External route store.
    pub store: StoreConfig,

    /// Service registry used to locate service targets.
    pub discovery: DiscoveryConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Refresh schedule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between scheduled refresh cycles.
    pub interval_secs: u64,

    /// Default per-source fetch timeout in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            fetch_timeout_ms: 5000,
        }
    }
}

/// Resolver behaviour shared by every route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Path prefix every routed request must carry (e.g. "/gateway").
    pub prefix: String,

    /// Remove `prefix` from the forwarded path.
    pub strip_prefix: bool,

    /// Patterns that are never routed.
    pub ignored_patterns: Vec<String>,

    /// Headers stripped for routes that do not set their own.
    pub sensitive_headers: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            strip_prefix: true,
            ignored_patterns: Vec::new(),
            sensitive_headers: vec![
                "authorization".to_string(),
                "cookie".to_string(),
                "set-cookie".to_string(),
            ],
        }
    }
}

/// Store backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSON file of `table -> rows`.
    File,
    /// HTTP endpoint serving `GET {location}/{table}`.
    Http,
}

/// External route store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,

    pub kind: StoreKind,

    /// File path or base URL, depending on `kind`.
    pub location: String,

    /// Optional namespace (keyspace) the table lives in.
    pub namespace: Option<String>,

    /// Table holding the routes.
    pub table: String,

    /// Overrides `refresh.fetch_timeout_ms` for this source.
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: StoreKind::File,
            location: "routes.json".to_string(),
            namespace: None,
            table: DEFAULT_TABLE.to_string(),
            fetch_timeout_ms: None,
        }
    }
}

/// Static service registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Service id to `host:port` list.
    pub services: HashMap<String, Vec<String>>,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
