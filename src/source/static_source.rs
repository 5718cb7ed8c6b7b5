//! Static default routes.

use async_trait::async_trait;

use crate::routing::{MalformedRecord, RouteRecord, RouteRow};
use crate::source::{RouteSource, SourceBatch, SourceError};

/// Routes fixed at construction. Fetching never fails.
#[derive(Debug, Clone)]
pub struct StaticRouteSource {
    origin: String,
    records: Vec<RouteRecord>,
}

impl StaticRouteSource {
    pub fn new(origin: impl Into<String>, records: Vec<RouteRecord>) -> Self {
        Self {
            origin: origin.into(),
            records,
        }
    }

    /// Decode config rows, failing on the first bad one.
    pub fn from_rows(origin: impl Into<String>, rows: &[RouteRow]) -> Result<Self, MalformedRecord> {
        let records = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                row.decode(idx).map_err(|error| MalformedRecord {
                    row: row.label(idx),
                    error,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(origin, records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        Ok(SourceBatch::new(self.records.clone()))
    }
}
