//! Service discovery collaborator.
//!
//! # Data Flow
//! ```text
//! ResolvedRoute (target = ServiceId)
//!     → Discovery::resolve_endpoint(service_id)
//!     → Endpoint (host:port) handed to whatever forwards the request
//! ```
//!
//! # Design Decisions
//! - Discovery is consumed through a trait, supplied at construction
//! - Route resolution itself never calls discovery
//! - The bundled registry is static config plus runtime register/deregister

pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub use registry::StaticDiscovery;

/// A concrete network location for a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid endpoint '{0}', expected host:port")]
pub struct InvalidEndpoint(pub String);

impl FromStr for Endpoint {
    type Err = InvalidEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| InvalidEndpoint(s.to_string()))?;
        let port = port.parse().map_err(|_| InvalidEndpoint(s.to_string()))?;
        if host.is_empty() {
            return Err(InvalidEndpoint(s.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Resolves a service name to an endpoint.
pub trait Discovery: Send + Sync {
    fn resolve_endpoint(&self, service_id: &str) -> Option<Endpoint>;
}
