//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry, http, config:
//!     → tracing events with structured fields (environment, key, path)
//!     → logging.rs subscriber (EnvFilter + fmt)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Request IDs come from tower-http and show up in access traces

pub mod logging;

pub use logging::{init_logging, LogLevelHandle};
