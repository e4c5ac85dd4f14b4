//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the multi-environment
//! service. All types derive Serde traits for deserialization from config files.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::{
    EnvRegistry, EnvironmentFlags, EnvironmentMarkers, SiloTemplateResolver, TemplateResolver,
    SILO_PLACEHOLDER,
};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// How the template environment is resolved for unregistered silos.
    pub template: TemplateConfig,

    /// Selector aliases rewritten before routing.
    pub aliases: Vec<AliasRule>,

    /// Per-environment configuration keyed by environment name.
    pub environments: EnvRegistry<SiloConfig>,
}

impl ServiceConfig {
    pub fn template_resolver(&self) -> SiloTemplateResolver {
        SiloTemplateResolver::new()
            .with_placeholder(self.template.placeholder.clone())
            .with_prefix_len(self.template.prefix_len)
    }

    /// Environment configuration that synthesizes unregistered silos from the
    /// template environment.
    pub fn environment_config(&self) -> EnvRegistry<SiloConfig> {
        let resolver: Arc<dyn TemplateResolver<SiloConfig>> = Arc::new(self.template_resolver());
        self.environments
            .convert_with(|_, silo| silo.clone(), Some(resolver))
    }

    /// Guest domain per environment.
    pub fn survey_url_default_domains(&self) -> EnvRegistry<String> {
        let resolver: Arc<dyn TemplateResolver<String>> = Arc::new(self.template_resolver());
        self.environments.convert_with(
            |_, silo| silo.survey_url_default_domain.clone().unwrap_or_default(),
            Some(resolver),
        )
    }

    /// Names of the configured environments.
    pub fn supported_environments(&self) -> EnvRegistry<String> {
        self.environments.convert(|environment, _| environment.to_string())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Template substitution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Token replaced in the template environment (default `XXX`).
    pub placeholder: String,

    /// Leading characters stripped from the environment key to obtain the
    /// replacement (`S999` → `999` with the default of 1).
    pub prefix_len: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            placeholder: SILO_PLACEHOLDER.to_string(),
            prefix_len: 1,
        }
    }
}

/// Maps alias selector values to a canonical environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AliasRule {
    /// Environment the aliases are rewritten to.
    pub canonical: String,

    /// Selector values to rewrite.
    pub aliases: Vec<String>,
}

/// Settings that differ between silos.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SiloConfig {
    #[serde(flatten)]
    pub flags: EnvironmentFlags,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_url_app_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_url_default_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field_service_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_database: Option<DatabaseConfig>,
}

impl EnvironmentMarkers for SiloConfig {
    fn is_default(&self) -> bool {
        self.flags.is_default()
    }

    fn is_template(&self) -> bool {
        self.flags.is_template()
    }
}

/// Database connection settings for a silo.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// JDBC-style connection URL.
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [template]
        placeholder = "XXX"

        [[aliases]]
        canonical = "P2"
        aliases = ["production", "prod", "pr01"]

        [environments.S115]
        default_environment_configuration = true
        survey_url_app_root = "/Surveys"
        survey_url_default_domain = "silo115-guest.a1.example.com"

        [environments.S115.database]
        url = "jdbc:sqlserver://a1-dba-115.a1.example.com:50000;database=PROD"
        user = "app"

        [environments.template]
        template = true
        survey_url_default_domain = "siloXXX-guest.a1.example.com"
        check_connection_while_idle = true

        [environments.template.database]
        url = "jdbc:sqlserver://a1-dba-XXX.a1.example.com:50000;database=PROD"
    "#;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.template.placeholder, "XXX");
        assert_eq!(config.template.prefix_len, 1);
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_parse_environments() {
        let config: ServiceConfig = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.aliases[0].canonical, "P2");
        assert_eq!(config.environments.len(), 2);
        let s115 = config.environments.get(Some("S115")).unwrap();
        assert_eq!(s115.survey_url_app_root.as_deref(), Some("/Surveys"));
        assert_eq!(s115.database.as_ref().map(|db| db.pool_size), Some(5));
    }

    #[test]
    fn test_environment_config_synthesizes() {
        let config: ServiceConfig = toml::from_str(CONFIG).unwrap();
        let environments = config.environment_config();
        let s999 = environments.get(Some("S999")).unwrap();
        assert_eq!(
            s999.survey_url_default_domain.as_deref(),
            Some("silo999-guest.a1.example.com")
        );
        assert_eq!(
            s999.database.as_ref().map(|db| db.url.as_str()),
            Some("jdbc:sqlserver://a1-dba-999.a1.example.com:50000;database=PROD")
        );
        // The loaded configuration itself stays eager.
        assert!(!config.environments.contains_key(Some("S999")));
    }

    #[test]
    fn test_derived_registries() {
        let config: ServiceConfig = toml::from_str(CONFIG).unwrap();

        let domains = config.survey_url_default_domains();
        assert_eq!(*domains.get(None).unwrap(), "silo115-guest.a1.example.com");
        assert_eq!(*domains.get(Some("S42")).unwrap(), "silo42-guest.a1.example.com");

        let names = config.supported_environments();
        assert_eq!(names.keys(), vec!["S115", "template"]);
        assert_eq!(*names.get(None).unwrap(), "S115");
    }
}
