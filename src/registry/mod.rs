//! Environment registry subsystem.
//!
//! # Data Flow
//! ```text
//! caller (explicit key, or key from context::current())
//!     → env_registry.rs (stored entry?)
//!     → creation function, or template.rs (resolve template entry)
//!     → cached under the key
//!     → Arc<T> returned
//! ```
//!
//! # Design Decisions
//! - At most one default and one template entry, enforced at `put`
//! - Markers are read from the value once, when it is stored
//! - Eager vs. template-backed is chosen at construction, never switched
//! - Synthesis runs outside map locks; the first cached value wins

mod codec;
mod env_registry;
mod error;
mod markers;
mod template;

pub use env_registry::{CreationFunction, EnvRegistry, Synthesis};
pub use error::{Conflict, EnvironmentError};
pub use markers::{EntryMarkers, EnvironmentFlags, EnvironmentMarkers};
pub use template::{SiloTemplateResolver, TemplateResolver, SILO_PLACEHOLDER};
