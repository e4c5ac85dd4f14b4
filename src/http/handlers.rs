//! Request handlers for the configuration endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::SiloConfig;
use crate::context;
use crate::http::server::AppState;
use crate::registry::{EnvRegistry, EnvironmentError};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

/// Known environments and their designations.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnvironmentSummary {
    pub environments: Vec<String>,
    pub default: Option<String>,
    pub template: Option<String>,
    pub current: Option<String>,
}

/// Configuration resolved for one environment.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub environment: String,
    pub config: SiloConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedDomain {
    pub environment: String,
    pub domain: String,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

pub async fn list_environments(State(state): State<AppState>) -> Json<EnvironmentSummary> {
    let environments = &state.environments;
    Json(EnvironmentSummary {
        environments: environments.keys(),
        default: environments.default_key().ok(),
        template: environments.template_key().ok(),
        current: context::current(),
    })
}

/// Configuration for the environment the request was scoped to.
pub async fn current_config(
    State(state): State<AppState>,
) -> Result<Json<ResolvedConfig>, EnvironmentError> {
    let selector = context::current();
    resolve(&state.environments, selector.as_deref())
}

/// Configuration for an explicitly named environment.
pub async fn config_for(
    State(state): State<AppState>,
    Path(environment): Path<String>,
) -> Result<Json<ResolvedConfig>, EnvironmentError> {
    resolve(&state.environments, Some(&environment))
}

/// Guest domain for the current environment.
pub async fn current_domain(
    State(state): State<AppState>,
) -> Result<Json<ResolvedDomain>, EnvironmentError> {
    let selector = context::current();
    let domain = state.domains.get(selector.as_deref())?;
    Ok(Json(ResolvedDomain {
        environment: selected_environment(&state.domains, selector.as_deref())?,
        domain: domain.as_ref().clone(),
    }))
}

fn resolve(
    environments: &EnvRegistry<SiloConfig>,
    selector: Option<&str>,
) -> Result<Json<ResolvedConfig>, EnvironmentError> {
    let config = environments.get(selector)?;
    Ok(Json(ResolvedConfig {
        environment: selected_environment(environments, selector)?,
        config: config.as_ref().clone(),
    }))
}

/// Name of the environment a selector resolved to (blank selects the default).
fn selected_environment<T>(
    registry: &EnvRegistry<T>,
    selector: Option<&str>,
) -> Result<String, EnvironmentError> {
    match selector {
        Some(environment) if !environment.trim().is_empty() => Ok(environment.to_string()),
        _ => registry.default_key(),
    }
}
