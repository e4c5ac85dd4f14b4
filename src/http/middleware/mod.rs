//! Request middleware.

pub mod alias;
pub mod environment;

pub use alias::{EnvironmentAlias, EnvironmentAliasLayer};
pub use environment::{environment_middleware, RequestEnvironment};
