//! Route resolution façade.
//!
//! # Responsibilities
//! - Turn an incoming request path into a forwarding decision
//! - Apply the global prefix and ignored patterns before matching
//! - Compute the path to forward (prefix stripping)
//!
//! # Design Decisions
//! - One atomic snapshot load per resolution; no locks
//! - `resolve` never talks to discovery; `upstream` is a separate step
//! - A miss is `None`, the proxy turns it into a 404

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::discovery::{Discovery, Endpoint};
use crate::observability::metrics;
use crate::routing::matcher::PathPattern;
use crate::routing::record::{RouteTarget, SensitiveHeaders};
use crate::routing::table::RouteTable;

/// Result of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub route_id: String,
    pub matched_pattern: String,
    /// Path to forward to the target.
    pub stripped_path: String,
    pub target: RouteTarget,
    pub strip_prefix: bool,
    pub retryable: bool,
    pub sensitive_headers: SensitiveHeaders,
    /// Lowercased headers to drop before forwarding: the route's own set, or
    /// the resolver default when the route leaves it unset.
    pub stripped_headers: BTreeSet<String>,
}

/// Where a resolved route actually goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    Endpoint(Endpoint),
    Url(String),
}

/// Resolves request paths against the published table.
#[derive(Clone)]
pub struct RouteResolver {
    table: Arc<RouteTable>,
    discovery: Arc<dyn Discovery>,
    prefix: String,
    strip_global_prefix: bool,
    ignored: Vec<PathPattern>,
    default_sensitive: BTreeSet<String>,
}

impl RouteResolver {
    pub fn new(table: Arc<RouteTable>, discovery: Arc<dyn Discovery>) -> Self {
        Self::with_config(table, discovery, &ResolverConfig::default())
    }

    pub fn with_config(
        table: Arc<RouteTable>,
        discovery: Arc<dyn Discovery>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            table,
            discovery,
            prefix: config.prefix.trim_end_matches('/').to_string(),
            strip_global_prefix: config.strip_prefix,
            ignored: config
                .ignored_patterns
                .iter()
                .map(|p| PathPattern::compile(p.clone()))
                .collect(),
            default_sensitive: config
                .sensitive_headers
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Resolve a request path to a route, or `None` when nothing matches.
    pub fn resolve(&self, request_path: &str) -> Option<ResolvedRoute> {
        let resolved = self.resolve_inner(request_path);
        metrics::record_resolution(resolved.is_some());
        resolved
    }

    fn resolve_inner(&self, request_path: &str) -> Option<ResolvedRoute> {
        let path = self.without_global_prefix(request_path)?;

        if self.ignored.iter().any(|p| p.matches(path)) {
            tracing::debug!(path = %request_path, "Path is ignored");
            return None;
        }

        let snapshot = self.table.snapshot();
        let entry = snapshot.find(path)?;
        let record = &entry.record;

        let mut stripped_path = if record.strip_prefix {
            entry.pattern.strip(path)
        } else {
            path.to_string()
        };
        if !self.prefix.is_empty() && !self.strip_global_prefix {
            stripped_path = format!("{}{}", self.prefix, stripped_path);
        }

        Some(ResolvedRoute {
            route_id: record.id.clone(),
            matched_pattern: record.path.clone(),
            stripped_path,
            target: record.target.clone(),
            strip_prefix: record.strip_prefix,
            retryable: record.retryable,
            sensitive_headers: record.sensitive_headers.clone(),
            stripped_headers: record
                .sensitive_headers
                .effective(&self.default_sensitive)
                .clone(),
        })
    }

    /// Path relative to the global prefix; `None` if the prefix is absent.
    fn without_global_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => Some("/"),
            Some(rest) if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    /// Concrete upstream for a resolved route, asking discovery for service targets.
    pub fn upstream(&self, route: &ResolvedRoute) -> Option<Upstream> {
        match &route.target {
            RouteTarget::Url(url) => Some(Upstream::Url(url.clone())),
            RouteTarget::ServiceId(id) => self.discovery.resolve_endpoint(id).map(Upstream::Endpoint),
        }
    }

    /// The table this resolver reads.
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }
}
