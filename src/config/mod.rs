//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → EnvRegistry::put for every [environments.*] table (marker checks)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → derived registries shared via Arc with the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AliasRule;
pub use schema::DatabaseConfig;
pub use schema::ServiceConfig;
pub use schema::SiloConfig;
