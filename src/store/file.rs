//! JSON file route store.
//!
//! The file maps table names to row arrays:
//!
//! ```json
//! { "gateway_routes": [ { "id": "api", "path": "/api/**", "service_id": "orders" } ] }
//! ```
//!
//! A namespaced table is keyed `namespace.table`, e.g. `"edge.gateway_routes"`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::routing::RouteRow;
use crate::store::{RouteStore, StoreError};

pub struct JsonFileRouteStore {
    path: PathBuf,
    table: String,
}

impl JsonFileRouteStore {
    pub fn new(path: impl AsRef<Path>, table: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: table.into(),
        }
    }
}

#[async_trait]
impl RouteStore for JsonFileRouteStore {
    async fn read_all_route_rows(&self) -> Result<Vec<RouteRow>, StoreError> {
        let path = self.path.clone();
        let table = self.table.clone();

        tokio::task::spawn_blocking(move || read_table(&path, &table))
            .await
            .map_err(|e| StoreError::Connection(format!("file reader task failed: {}", e)))?
    }
}

fn read_table(path: &Path, table: &str) -> Result<Vec<RouteRow>, StoreError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
    let mut tables: HashMap<String, Vec<RouteRow>> =
        serde_json::from_str(&content).map_err(|e| StoreError::Decode(e.to_string()))?;
    tables
        .remove(table)
        .ok_or_else(|| StoreError::MissingTable(table.to_string()))
}
