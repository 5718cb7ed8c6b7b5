//! Published route table.
//!
//! # Responsibilities
//! - Hold the current ordered set of routes and their compiled patterns
//! - Hand out consistent snapshots to readers
//! - Replace the whole set in one atomic swap
//!
//! # Design Decisions
//! - Snapshots are immutable; a refresh builds a new one and swaps the `Arc`
//! - Readers never lock and never see a half-built table
//! - Insertion order is kept because the matcher breaks ties with it

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::matcher::{PathMatcher, PathPattern};
use crate::routing::record::RouteRecord;

/// One published route: the record plus its compiled pattern.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub record: Arc<RouteRecord>,
    pub pattern: PathPattern,
}

/// Immutable view of the table at one generation.
#[derive(Debug, Default)]
pub struct RouteSnapshot {
    generation: u64,
    entries: Vec<TableEntry>,
    by_path: HashMap<String, usize>,
}

impl RouteSnapshot {
    /// Build a snapshot from records in order. A repeated path replaces the
    /// earlier record but keeps the earlier position.
    pub fn build<I>(generation: u64, records: I) -> Self
    where
        I: IntoIterator<Item = Arc<RouteRecord>>,
    {
        let mut entries: Vec<TableEntry> = Vec::new();
        let mut by_path: HashMap<String, usize> = HashMap::new();

        for record in records {
            match by_path.get(&record.path) {
                Some(&idx) => entries[idx].record = record,
                None => {
                    by_path.insert(record.path.clone(), entries.len());
                    entries.push(TableEntry {
                        pattern: PathPattern::compile(record.path.clone()),
                        record,
                    });
                }
            }
        }

        Self {
            generation,
            entries,
            by_path,
        }
    }

    /// Refresh cycle that produced this snapshot (0 = never refreshed).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes in table order.
    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<RouteRecord>> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Route registered under exactly this pattern.
    pub fn get(&self, path: &str) -> Option<&TableEntry> {
        self.by_path.get(path).map(|&idx| &self.entries[idx])
    }

    /// Best route for a request path.
    pub fn find(&self, request_path: &str) -> Option<&TableEntry> {
        PathMatcher::best_match(request_path, self.entries.iter().map(|e| &e.pattern))
            .map(|idx| &self.entries[idx])
    }
}

/// Shared handle to the published routes.
#[derive(Debug)]
pub struct RouteTable {
    current: ArcSwap<RouteSnapshot>,
}

impl RouteTable {
    /// An empty table at generation 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteSnapshot::default()),
        }
    }

    /// Current snapshot. One atomic load; hold it for the whole lookup.
    pub fn snapshot(&self) -> Arc<RouteSnapshot> {
        self.current.load_full()
    }

    /// Replace the whole table.
    pub fn publish(&self, snapshot: RouteSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
