//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Sources → Refresher → First cycle → Scheduler
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Scheduler finishes current cycle and exits → Admin server drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: routes are published before the admin API listens
//! - A source failure at startup degrades, it does not abort

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{RouteService, StartupError};
