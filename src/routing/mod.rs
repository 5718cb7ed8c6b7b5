//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → resolver.rs (global prefix, ignored patterns)
//!     → table.rs (load current snapshot)
//!     → matcher.rs (best pattern)
//!     → Return: ResolvedRoute or None
//!
//! Refresh cycle (see refresh/):
//!     RouteRecord[] merged by path
//!     → Compile patterns
//!     → Freeze as immutable RouteSnapshot
//!     → Atomic swap into RouteTable
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable, replaced wholesale
//! - No regex in hot path (segment matching only)
//! - Deterministic: same table and path always give the same route
//! - Literal match first, then longest fixed prefix, then table order

pub mod matcher;
pub mod record;
pub mod resolver;
pub mod table;

pub use matcher::{PathMatcher, PathPattern};
pub use record::{MalformedRecord, RecordError, RouteRecord, RouteRow, RouteTarget, SensitiveHeaders};
pub use resolver::{ResolvedRoute, RouteResolver, Upstream};
pub use table::{RouteSnapshot, RouteTable, TableEntry};
