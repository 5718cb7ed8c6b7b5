//! HTTP route store.
//!
//! Reads `GET {base_url}/{table}` (or `{base_url}/{namespace}/{table}`),
//! expecting a JSON array of rows.

use std::time::Duration;

use async_trait::async_trait;

use crate::routing::RouteRow;
use crate::store::{RouteStore, StoreError};

pub struct HttpRouteStore {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpRouteStore {
    pub fn new(base_url: &str, table: &str) -> Result<Self, StoreError> {
        Self::with_namespace(base_url, None, table)
    }

    pub fn with_namespace(
        base_url: &str,
        namespace: Option<&str>,
        table: &str,
    ) -> Result<Self, StoreError> {
        let mut base = url::Url::parse(base_url)
            .map_err(|e| StoreError::Connection(format!("invalid store url '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let relative = match namespace {
            Some(ns) => format!("{}/{}", ns, table),
            None => table.to_string(),
        };
        let endpoint = base
            .join(&relative)
            .map_err(|e| StoreError::Connection(format!("invalid table '{}': {}", table, e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl RouteStore for HttpRouteStore {
    async fn read_all_route_rows(&self) -> Result<Vec<RouteRow>, StoreError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::MissingTable(self.endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Connection(format!("store returned {}", status)));
        }

        response
            .json::<Vec<RouteRow>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
