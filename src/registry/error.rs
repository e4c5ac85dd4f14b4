//! Error definitions for environment resolution.

use thiserror::Error;

/// Errors raised while registering or resolving environment configuration.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// Selector was absent or blank and no default environment is configured.
    #[error("[environment] property is mandatory and can't be empty")]
    MissingEnvironment,

    /// Selector matched nothing and no value could be synthesized for it.
    #[error("Failed to find configuration for environment {key}")]
    UnknownEnvironment { key: String },

    /// The registry contents are inconsistent (detected at `put` time).
    #[error(transparent)]
    ConfigurationConflict(#[from] Conflict),

    /// Synthesizing a value from the template failed.
    #[error("Failed to resolve template for environment {key}: {source}")]
    TemplateResolution {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The no-argument accessor was used without a default environment.
    #[error("This instance has no default environment configuration")]
    NoDefaultConfigured,

    /// The template key was requested without a template environment.
    #[error("This instance has no template environment configuration")]
    NoTemplateConfigured,
}

impl EnvironmentError {
    /// Wrap a resolver fault for `key`.
    pub fn template_resolution(
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::TemplateResolution {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Authoring defects caught when an entry is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Expected non-empty value for environment, was: {key:?}")]
    BlankKey { key: String },

    #[error("Only one default environment is allowed per instance. Found {key} and {existing}")]
    DuplicateDefault { key: String, existing: String },

    #[error("Only one template environment is allowed per instance. Found {key} and {existing}")]
    DuplicateTemplate { key: String, existing: String },

    #[error("You cannot have a configuration be a default and a template at the same time. Found {key}")]
    DefaultAndTemplate { key: String },
}
