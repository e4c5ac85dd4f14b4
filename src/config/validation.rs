//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, `put` handles markers)
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - Detect ambiguous alias rules
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A semantic problem in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("template placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("alias rule has an empty canonical environment")]
    EmptyCanonical,

    #[error("alias '{alias}' maps to both '{first}' and '{second}'")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("no environments configured")]
    NoEnvironments,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.template.placeholder.is_empty() {
        errors.push(ValidationError::EmptyPlaceholder);
    }

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for rule in &config.aliases {
        if rule.canonical.trim().is_empty() {
            errors.push(ValidationError::EmptyCanonical);
            continue;
        }
        for alias in &rule.aliases {
            match seen.get(alias.as_str()) {
                Some(first) if *first != rule.canonical => {
                    errors.push(ValidationError::AmbiguousAlias {
                        alias: alias.clone(),
                        first: first.to_string(),
                        second: rule.canonical.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(alias, &rule.canonical);
                }
            }
        }
    }

    if config.environments.is_empty() {
        errors.push(ValidationError::NoEnvironments);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
