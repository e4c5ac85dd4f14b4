//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → middleware/alias.rs (rewrite ?environment= aliases, pre-routing)
//!     → server.rs (request ID, trace, timeout)
//!     → middleware/environment.rs (scope the request to its environment)
//!     → handlers.rs (resolve configuration from the registry)
//!     → response.rs (resolution failures as 400 JSON)
//!
//! outbound request
//!     → propagation.rs (append ?environment= from the current context)
//! ```

pub mod handlers;
pub mod middleware;
pub mod propagation;
pub mod query;
pub mod response;
pub mod server;

pub use middleware::{environment_middleware, EnvironmentAliasLayer, RequestEnvironment};
pub use propagation::{EnvironmentPropagationLayer, PropagateEnvironment};
pub use query::ENVIRONMENT_PARAM;
pub use response::ErrorMessage;
pub use server::{AppState, HttpServer};
