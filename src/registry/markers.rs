//! Default/template markers carried by registry values.

use serde::{Deserialize, Serialize};

/// Capability markers a value reports when it is stored in a registry.
///
/// Both methods default to `false`, so plain payloads opt in with an empty
/// `impl`. The markers are read once, at `put` time.
pub trait EnvironmentMarkers {
    /// Whether this value is the default environment configuration.
    fn is_default(&self) -> bool {
        false
    }

    /// Whether this value is the template for unregistered environments.
    fn is_template(&self) -> bool {
        false
    }
}

impl EnvironmentMarkers for String {}
impl EnvironmentMarkers for u16 {}

impl<T: EnvironmentMarkers> EnvironmentMarkers for std::sync::Arc<T> {
    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn is_template(&self) -> bool {
        (**self).is_template()
    }
}

/// Explicit markers for values that don't carry their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMarkers {
    pub default: bool,
    pub template: bool,
}

impl EntryMarkers {
    pub const NONE: Self = Self {
        default: false,
        template: false,
    };
    pub const DEFAULT: Self = Self {
        default: true,
        template: false,
    };
    pub const TEMPLATE: Self = Self {
        default: false,
        template: true,
    };

    /// Read the markers a value reports about itself.
    pub fn of<T: EnvironmentMarkers + ?Sized>(value: &T) -> Self {
        Self {
            default: value.is_default(),
            template: value.is_template(),
        }
    }
}

/// Marker fields embedded (flattened) into environment configuration records.
///
/// ```toml
/// [environments.S115]
/// default_environment_configuration = true
///
/// [environments.template]
/// template = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentFlags {
    pub default_environment_configuration: bool,
    pub template: bool,
}

impl EnvironmentMarkers for EnvironmentFlags {
    fn is_default(&self) -> bool {
        self.default_environment_configuration
    }

    fn is_template(&self) -> bool {
        self.template
    }
}
