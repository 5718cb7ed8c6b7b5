//! Route sources.
//!
//! # Data Flow
//! ```text
//! Static config routes ──▶ StaticRouteSource ──┐
//!                                               ├──▶ RouteRefresher (fetch, in registration order)
//! RouteStore rows ──▶ StoredRouteSource ───────┘
//!                     (decode, skip malformed)
//! ```
//!
//! # Design Decisions
//! - Every origin implements `RouteSource`; new origins never subclass
//! - A fetch returns the full current set, never a delta
//! - Malformed rows are reported alongside the good ones, not as a failure

pub mod static_source;
pub mod stored;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::routing::{MalformedRecord, RouteRecord};

pub use static_source::StaticRouteSource;
pub use stored::StoredRouteSource;

/// Records produced by one fetch.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Valid records in source order.
    pub records: Vec<RouteRecord>,
    /// Rows that were skipped.
    pub malformed: Vec<MalformedRecord>,
}

impl SourceBatch {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self {
            records,
            malformed: Vec::new(),
        }
    }
}

/// Why a source could not produce its routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The origin could not be reached or returned unreadable data.
    #[error("source '{origin}' unavailable: {reason}")]
    Unavailable { origin: String, reason: String },

    /// The fetch did not finish within the per-source limit.
    #[error("source '{origin}' timed out after {after:?}")]
    Timeout { origin: String, after: Duration },
}

impl SourceError {
    pub fn origin(&self) -> &str {
        match self {
            SourceError::Unavailable { origin, .. } | SourceError::Timeout { origin, .. } => origin,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Unavailable { .. } => "unavailable",
            SourceError::Timeout { .. } => "timeout",
        }
    }
}

/// A provider of route records.
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Name used in logs, metrics and status output.
    fn origin(&self) -> &str;

    /// Produce the full current set of routes from this origin.
    async fn fetch(&self) -> Result<SourceBatch, SourceError>;
}
