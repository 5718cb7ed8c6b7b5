//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use gateway_routes::routing::{RouteRecord, RouteRow};
use gateway_routes::source::{RouteSource, StaticRouteSource};
use gateway_routes::store::{RouteStore, StoreError};

/// In-memory route store whose rows and availability can change between fetches.
#[derive(Default)]
pub struct MemoryRouteStore {
    rows: Mutex<Vec<RouteRow>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryRouteStore {
    pub fn new(rows: Vec<RouteRow>) -> Arc<Self> {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        Arc::new(store)
    }

    pub fn set_rows(&self, rows: Vec<RouteRow>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every read sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Every read waits for a permit from the returned semaphore.
    pub fn gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Most reads that were ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn read(&self) -> Result<Vec<RouteRow>, StoreError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn read_all_route_rows(&self) -> Result<Vec<RouteRow>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let result = self.read().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A row routed to a service.
pub fn service_row(id: &str, path: &str, service_id: &str) -> RouteRow {
    RouteRow {
        id: Some(id.into()),
        path: Some(path.into()),
        service_id: Some(service_id.into()),
        ..Default::default()
    }
}

pub fn static_source(records: Vec<RouteRecord>) -> Arc<dyn RouteSource> {
    Arc::new(StaticRouteSource::new("static", records))
}

/// Poll until `condition` holds, failing the test after two seconds.
pub async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
