//! In-memory service registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;

use crate::discovery::{Discovery, Endpoint};

/// Registry keyed by service id. The first registered endpoint is returned.
#[derive(Clone, Default)]
pub struct StaticDiscovery {
    services: Arc<DashMap<String, Vec<Endpoint>>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a `service -> [host:port]` map, skipping unparsable entries.
    pub fn from_config(services: &HashMap<String, Vec<String>>) -> Self {
        let registry = Self::new();
        for (service_id, addrs) in services {
            for addr in addrs {
                match addr.parse::<Endpoint>() {
                    Ok(ep) => registry.register(service_id, ep),
                    Err(e) => tracing::warn!(service = %service_id, error = %e, "Ignoring discovery entry"),
                }
            }
        }
        registry
    }

    pub fn register(&self, service_id: &str, endpoint: Endpoint) {
        let mut entry = self.services.entry(service_id.to_string()).or_default();
        if !entry.contains(&endpoint) {
            entry.push(endpoint);
        }
    }

    /// Remove one endpoint; the service disappears with its last endpoint.
    /// Returns true if the endpoint was registered.
    pub fn deregister(&self, service_id: &str, endpoint: &Endpoint) -> bool {
        let (removed, now_empty) = match self.services.get_mut(service_id) {
            Some(mut eps) => {
                let before = eps.len();
                eps.retain(|e| e != endpoint);
                (eps.len() != before, eps.is_empty())
            }
            None => (false, false),
        };
        if now_empty {
            self.services.remove(service_id);
        }
        removed
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Copy of every service and its endpoints, sorted by service id.
    pub fn services(&self) -> BTreeMap<String, Vec<Endpoint>> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Discovery for StaticDiscovery {
    fn resolve_endpoint(&self, service_id: &str) -> Option<Endpoint> {
        self.services
            .get(service_id)
            .and_then(|eps| eps.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut cfg = HashMap::new();
        cfg.insert(
            "auth".to_string(),
            vec!["127.0.0.1:9000".to_string(), "garbage".to_string()],
        );
        let registry = StaticDiscovery::from_config(&cfg);

        assert_eq!(
            registry.resolve_endpoint("auth").map(|e| e.to_string()),
            Some("127.0.0.1:9000".to_string())
        );
        assert!(registry.resolve_endpoint("orders").is_none());
    }

    #[test]
    fn test_deregister_last_endpoint_removes_service() {
        let registry = StaticDiscovery::new();
        let ep: Endpoint = "10.0.0.1:80".parse().unwrap();
        registry.register("web", ep.clone());
        registry.register("web", ep.clone());
        assert_eq!(registry.service_count(), 1);

        assert!(registry.deregister("web", &ep));
        assert!(!registry.deregister("web", &ep));
        assert!(registry.resolve_endpoint("web").is_none());
        assert_eq!(registry.service_count(), 0);
        assert!(registry.services().is_empty());
    }
}
