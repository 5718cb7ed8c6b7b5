//! Route refresh subsystem.
//!
//! # Data Flow
//! ```text
//! scheduler.rs (interval tick | manual trigger)
//!     → refresher.rs
//!         Fetching: every RouteSource, each under its own timeout
//!         Merging: registration order, later source wins per path
//!         Publishing: RouteTable swap
//!     → state.rs (cycle state, route health)
//! ```
//!
//! # Design Decisions
//! - Failed sources keep serving their last good routes
//! - An all-failed first cycle publishes an empty table and reports it, never panics
//! - Cycles never overlap

pub mod refresher;
pub mod scheduler;
pub mod state;

pub use refresher::{CycleReport, RefreshError, RefreshStatus, RouteRefresher, SourceFailure, TriggerOutcome};
pub use scheduler::RefreshScheduler;
pub use state::{RefreshState, RouteHealth};
