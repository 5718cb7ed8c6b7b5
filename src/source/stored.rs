//! Routes backed by an external store.
//!
//! # Responsibilities
//! - Read every row of the route table through a `RouteStore`
//! - Decode rows into records, skipping and counting malformed ones
//! - Map store failures to `SourceError::Unavailable`

use std::sync::Arc;

use async_trait::async_trait;

use crate::observability::metrics;
use crate::routing::MalformedRecord;
use crate::source::{RouteSource, SourceBatch, SourceError};
use crate::store::RouteStore;

/// A `RouteSource` over an external `RouteStore`.
#[derive(Clone)]
pub struct StoredRouteSource {
    origin: String,
    store: Arc<dyn RouteStore>,
}

impl StoredRouteSource {
    pub fn new(origin: impl Into<String>, store: Arc<dyn RouteStore>) -> Self {
        Self {
            origin: origin.into(),
            store,
        }
    }
}

#[async_trait]
impl RouteSource for StoredRouteSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        let rows = self
            .store
            .read_all_route_rows()
            .await
            .map_err(|e| SourceError::Unavailable {
                origin: self.origin.clone(),
                reason: e.to_string(),
            })?;

        let mut batch = SourceBatch::default();
        for (idx, row) in rows.iter().enumerate() {
            match row.decode(idx) {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    let malformed = MalformedRecord {
                        row: row.label(idx),
                        error,
                    };
                    tracing::warn!(origin = %self.origin, row = %malformed.row, error = %malformed.error, "Skipping malformed route row");
                    batch.malformed.push(malformed);
                }
            }
        }

        if !batch.malformed.is_empty() {
            metrics::record_malformed_records(&self.origin, batch.malformed.len());
        }
        tracing::debug!(
            origin = %self.origin,
            rows = rows.len(),
            valid = batch.records.len(),
            "Fetched stored routes"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RecordError, RouteRow, RouteTarget};
    use crate::store::StoreError;

    struct FixedStore(Result<Vec<RouteRow>, StoreError>);

    #[async_trait]
    impl RouteStore for FixedStore {
        async fn read_all_route_rows(&self) -> Result<Vec<RouteRow>, StoreError> {
            self.0.clone()
        }
    }

    fn row(id: &str, path: &str, service_id: Option<&str>, url: Option<&str>) -> RouteRow {
        RouteRow {
            id: Some(id.into()),
            path: Some(path.into()),
            service_id: service_id.map(Into::into),
            url: url.map(Into::into),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped_not_fatal() {
        let store = FixedStore(Ok(vec![
            row("resource", "/api/**", Some("rest-service"), None),
            row("empty", "", Some("svc"), None),
            row("both", "/both/**", Some("svc"), Some("http://x")),
            row("none", "/none/**", None, None),
            row("site", "/site/**", None, Some("http://site.local")),
        ]));
        let source = StoredRouteSource::new("store", Arc::new(store));

        let batch = source.fetch().await.unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].target, RouteTarget::ServiceId("rest-service".into()));
        assert_eq!(batch.records[1].target, RouteTarget::Url("http://site.local".into()));

        let bad: Vec<(&str, &RecordError)> = batch
            .malformed
            .iter()
            .map(|m| (m.row.as_str(), &m.error))
            .collect();
        assert_eq!(
            bad,
            vec![
                ("empty", &RecordError::EmptyPath),
                ("both", &RecordError::AmbiguousTarget),
                ("none", &RecordError::MissingTarget),
            ]
        );
    }

    #[tokio::test]
    async fn test_store_error_maps_to_unavailable() {
        let store = FixedStore(Err(StoreError::Connection("refused".into())));
        let source = StoredRouteSource::new("store", Arc::new(store));

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.origin(), "store");
        assert_eq!(err.kind(), "unavailable");
        assert!(err.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let source = StoredRouteSource::new("store", Arc::new(FixedStore(Ok(vec![]))));
        let batch = source.fetch().await.unwrap();
        assert!(batch.records.is_empty());
        assert!(batch.malformed.is_empty());
    }
}
