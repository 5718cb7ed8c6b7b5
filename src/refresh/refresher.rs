//! Route refresh cycles.
//!
//! # Responsibilities
//! - Fetch every registered source with a per-source timeout
//! - Keep each source's last good routes for when it fails
//! - Merge sources in registration order, later ones overriding by path
//! - Publish the merged table in one swap
//! - Collapse manual triggers
//!
//! # Design Decisions
//! - One cycle at a time (async mutex); readers never touch it
//! - A manual trigger during a cycle is queued and runs once afterwards;
//!   a second trigger while one is queued is rejected
//! - A queued trigger is absorbed by whichever cycle starts fetching next
//! - A started cycle always completes, even across shutdown

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

use crate::observability::metrics;
use crate::refresh::state::{RefreshState, RouteHealth};
use crate::routing::{RouteRecord, RouteSnapshot, RouteTable};
use crate::source::{RouteSource, SourceBatch, SourceError};

/// A source plus its fetch limit.
#[derive(Clone)]
struct RegisteredSource {
    source: Arc<dyn RouteSource>,
    timeout: Duration,
}

impl RegisteredSource {
    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        match tokio::time::timeout(self.timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                origin: self.source.origin().to_string(),
                after: self.timeout,
            }),
        }
    }
}

/// Data carried between cycles. Only touched under the cycle lock.
#[derive(Default)]
struct CycleState {
    generation: u64,
    /// Last successfully fetched records per source, by registration index.
    last_good: Vec<Option<Vec<Arc<RouteRecord>>>>,
}

/// One failed source in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub origin: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<&SourceError> for SourceFailure {
    fn from(err: &SourceError) -> Self {
        Self {
            origin: err.origin().to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub generation: u64,
    /// Routes in the published table.
    pub routes: usize,
    pub failed: Vec<SourceFailure>,
    /// Rows skipped as malformed across all sources.
    pub malformed: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Every source failed and no source has ever produced routes.
    #[error("all {} route sources failed", .failures.len())]
    AllSourcesFailed { failures: Vec<SourceError> },
}

/// Answer to a manual refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A refresh is queued.
    Accepted,
    /// A manual refresh is already queued.
    Rejected,
}

/// Point-in-time view for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    pub health: RouteHealth,
    pub generation: u64,
    pub routes: usize,
    pub pending_trigger: bool,
    pub sources: Vec<String>,
    pub last_cycle: Option<CycleReport>,
}

/// Drives fetch → merge → publish cycles into a `RouteTable`.
pub struct RouteRefresher {
    table: Arc<RouteTable>,
    sources: Vec<RegisteredSource>,
    cycle: Mutex<CycleState>,
    state: AtomicU8,
    health: AtomicU8,
    pending: AtomicBool,
    trigger: Notify,
    last_cycle: ArcSwapOption<CycleReport>,
}

impl RouteRefresher {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            sources: Vec::new(),
            cycle: Mutex::new(CycleState::default()),
            state: AtomicU8::new(RefreshState::Idle as u8),
            health: AtomicU8::new(RouteHealth::Starting as u8),
            pending: AtomicBool::new(false),
            trigger: Notify::new(),
            last_cycle: ArcSwapOption::empty(),
        }
    }

    /// Register a source. Registration order is merge order: later sources
    /// override earlier ones on the same path.
    pub fn register(mut self, source: Arc<dyn RouteSource>, timeout: Duration) -> Self {
        tracing::info!(origin = %source.origin(), timeout = ?timeout, "Registered route source");
        self.sources.push(RegisteredSource { source, timeout });
        self
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn state(&self) -> RefreshState {
        RefreshState::from(self.state.load(Ordering::Acquire))
    }

    pub fn health(&self) -> RouteHealth {
        RouteHealth::from(self.health.load(Ordering::Acquire))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn set_state(&self, state: RefreshState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Queue a refresh without waiting for it.
    pub fn refresh_now(&self) -> TriggerOutcome {
        if self.pending.swap(true, Ordering::AcqRel) {
            tracing::debug!("Manual refresh already queued");
            return TriggerOutcome::Rejected;
        }
        self.trigger.notify_one();
        tracing::info!("Manual refresh queued");
        TriggerOutcome::Accepted
    }

    /// Drop a queued manual refresh that has not started. Returns true if one was queued.
    pub fn cancel_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub(crate) async fn triggered(&self) {
        self.trigger.notified().await
    }

    /// Run one full cycle, waiting for any in-flight cycle first.
    pub async fn refresh(&self) -> Result<CycleReport, RefreshError> {
        let mut cycle = self.cycle.lock().await;
        // Anything queued so far is served by this cycle.
        self.pending.store(false, Ordering::Release);

        let started = Instant::now();
        self.set_state(RefreshState::Fetching);
        if cycle.last_good.len() != self.sources.len() {
            cycle.last_good.resize(self.sources.len(), None);
        }

        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;

        let mut failures = Vec::new();
        let mut malformed = 0;
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(batch) => {
                    malformed += batch.malformed.len();
                    cycle.last_good[idx] = Some(batch.records.into_iter().map(Arc::new).collect());
                }
                Err(err) => {
                    let stale = cycle.last_good[idx].as_ref().map(Vec::len);
                    tracing::warn!(
                        origin = %err.origin(),
                        error = %err,
                        stale_routes = ?stale,
                        "Route source failed, keeping previous routes"
                    );
                    metrics::record_source_failure(err.origin(), err.kind());
                    failures.push(err);
                }
            }
        }
        if !failures.is_empty() {
            self.set_state(RefreshState::Failed);
        }

        self.set_state(RefreshState::Merging);
        cycle.generation += 1;
        let merged = cycle
            .last_good
            .iter()
            .flatten()
            .flat_map(|records| records.iter().cloned());
        let snapshot = RouteSnapshot::build(cycle.generation, merged);
        let routes = snapshot.len();

        self.set_state(RefreshState::Publishing);
        self.table.publish(snapshot);
        metrics::record_table_size(routes);

        let never_succeeded = cycle.last_good.iter().all(Option::is_none);
        let all_failed = !self.sources.is_empty() && failures.len() == self.sources.len();
        let health = if all_failed && never_succeeded {
            RouteHealth::AllSourcesFailed
        } else if failures.is_empty() {
            RouteHealth::Ready
        } else {
            RouteHealth::Degraded
        };
        self.health.store(health as u8, Ordering::Release);

        let report = CycleReport {
            generation: cycle.generation,
            routes,
            failed: failures.iter().map(SourceFailure::from).collect(),
            malformed,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.last_cycle.store(Some(Arc::new(report.clone())));
        self.set_state(RefreshState::Idle);

        if health == RouteHealth::AllSourcesFailed {
            metrics::record_refresh_cycle("all_failed", started);
            tracing::error!(generation = report.generation, "All route sources failed, route table is empty");
            return Err(RefreshError::AllSourcesFailed { failures });
        }

        metrics::record_refresh_cycle(if failures.is_empty() { "ok" } else { "partial" }, started);
        tracing::info!(
            generation = report.generation,
            routes = report.routes,
            failed_sources = report.failed.len(),
            malformed = report.malformed,
            "Route table published"
        );
        Ok(report)
    }

    pub fn status(&self) -> RefreshStatus {
        let snapshot = self.table.snapshot();
        RefreshStatus {
            state: self.state(),
            health: self.health(),
            generation: snapshot.generation(),
            routes: snapshot.len(),
            pending_trigger: self.is_pending(),
            sources: self
                .sources
                .iter()
                .map(|s| s.source.origin().to_string())
                .collect(),
            last_cycle: self.last_cycle.load_full().map(|r| (*r).clone()),
        }
    }
}
