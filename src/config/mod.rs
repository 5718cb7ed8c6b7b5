//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, static routes decoded)
//!     → GatewayConfig (validated, immutable)
//!     → startup builds sources, refresher, resolver from it
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; routes change through the store, not the file
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, DiscoveryConfig, GatewayConfig, ObservabilityConfig, RefreshConfig, ResolverConfig,
    StoreConfig, StoreKind,
};
pub use validation::ValidationError;
