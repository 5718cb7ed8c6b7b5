//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Static routes must decode into valid records with unique paths
//! - Validate value ranges (interval and timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, StoreKind};
use crate::discovery::Endpoint;
use crate::routing::MalformedRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("refresh.interval_secs must be greater than 0")]
    ZeroInterval,

    #[error("{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("static route: {0}")]
    StaticRoute(MalformedRecord),

    #[error("static route path '{0}' is defined more than once")]
    DuplicatePath(String),

    #[error("resolver.prefix '{0}' must start with '/'")]
    InvalidPrefix(String),

    #[error("store.location must not be empty")]
    EmptyStoreLocation,

    #[error("store.table must not be empty")]
    EmptyStoreTable,

    #[error("store.namespace '{0}' must be non-empty and contain no '.' or '/'")]
    InvalidStoreNamespace(String),

    #[error("store.location '{0}' is not a valid URL")]
    InvalidStoreUrl(String),

    #[error("discovery endpoint '{endpoint}' for service '{service}' is not host:port")]
    InvalidEndpoint { service: String, endpoint: String },

    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a parsed config, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.refresh.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if config.refresh.fetch_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("refresh.fetch_timeout_ms"));
    }

    let prefix = &config.resolver.prefix;
    if !prefix.is_empty() && !prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    let mut seen = HashSet::new();
    for (idx, row) in config.routes.iter().enumerate() {
        match row.decode(idx) {
            Ok(record) => {
                if !seen.insert(record.path.clone()) {
                    errors.push(ValidationError::DuplicatePath(record.path));
                }
            }
            Err(error) => errors.push(ValidationError::StaticRoute(MalformedRecord {
                row: row.label(idx),
                error,
            })),
        }
    }

    if config.store.enabled {
        let store = &config.store;
        if store.location.trim().is_empty() {
            errors.push(ValidationError::EmptyStoreLocation);
        } else if store.kind == StoreKind::Http && url::Url::parse(&store.location).is_err() {
            errors.push(ValidationError::InvalidStoreUrl(store.location.clone()));
        }
        if store.table.trim().is_empty() {
            errors.push(ValidationError::EmptyStoreTable);
        }
        if let Some(ns) = &store.namespace {
            if ns.trim().is_empty() || ns.contains(['.', '/']) {
                errors.push(ValidationError::InvalidStoreNamespace(ns.clone()));
            }
        }
        if store.fetch_timeout_ms == Some(0) {
            errors.push(ValidationError::ZeroTimeout("store.fetch_timeout_ms"));
        }
    }

    for (service, endpoints) in &config.discovery.services {
        for endpoint in endpoints {
            if endpoint.parse::<Endpoint>().is_err() {
                errors.push(ValidationError::InvalidEndpoint {
                    service: service.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RecordError, RouteRow};

    fn route(id: &str, path: &str) -> RouteRow {
        RouteRow {
            id: Some(id.into()),
            path: Some(path.into()),
            service_id: Some(id.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.refresh.interval_secs = 0;
        config.routes.push(route("a", "/a/**"));
        config.routes.push(route("a2", "/a/**"));
        config.routes.push(RouteRow {
            id: Some("bad".into()),
            path: Some("/bad/**".into()),
            ..Default::default()
        });
        config.store.enabled = true;
        config.store.kind = StoreKind::Http;
        config.store.location = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroInterval));
        assert!(errors.contains(&ValidationError::DuplicatePath("/a/**".into())));
        assert!(errors.contains(&ValidationError::StaticRoute(MalformedRecord {
            row: "bad".into(),
            error: RecordError::MissingTarget,
        })));
        assert!(errors.contains(&ValidationError::InvalidStoreUrl("nope".into())));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_store_namespace() {
        let mut config = GatewayConfig::default();
        config.store.enabled = true;
        config.store.namespace = Some("edge".into());
        assert!(validate_config(&config).is_ok());

        config.store.namespace = Some("a.b".into());
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidStoreNamespace("a.b".into())]
        );
    }

    #[test]
    fn test_bad_discovery_and_prefix() {
        let mut config = GatewayConfig::default();
        config.resolver.prefix = "gw".into();
        config
            .discovery
            .services
            .insert("svc".into(), vec!["no-port".into()]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
