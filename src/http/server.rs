//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, environment scope)
//! - Rewrite environment aliases before routing
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ServiceConfig, SiloConfig};
use crate::http::handlers;
use crate::http::middleware::{environment_middleware, EnvironmentAlias, EnvironmentAliasLayer};
use crate::lifecycle::wait_for_shutdown;
use crate::registry::EnvRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub environments: Arc<EnvRegistry<SiloConfig>>,
    pub domains: Arc<EnvRegistry<String>>,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            environments: Arc::new(config.environment_config()),
            domains: Arc::new(config.survey_url_default_domains()),
        }
    }
}

/// HTTP server exposing per-environment configuration.
pub struct HttpServer {
    app: EnvironmentAlias<Router>,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig) -> Self {
        let state = AppState::from_config(config);
        let router = Self::build_router(config, state.clone());
        let app = EnvironmentAliasLayer::from_rules(&config.aliases).layer(router);
        Self { app, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::get_status))
            .route("/environments", get(handlers::list_environments))
            .route("/config", get(handlers::current_config))
            .route("/config/domain", get(handlers::current_domain))
            .route("/config/{environment}", get(handlers::config_for))
            .layer(middleware::from_fn(environment_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The complete service, alias rewrite included.
    pub fn app(&self) -> EnvironmentAlias<Router> {
        self.app.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environments = self.state.environments.len(),
            "HTTP server starting"
        );

        let app = axum::ServiceExt::<axum::extract::Request>::into_make_service(self.app);
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    const CONFIG: &str = r#"
        [[aliases]]
        canonical = "S116"
        aliases = ["staging"]

        [environments.S115]
        default_environment_configuration = true
        survey_url_default_domain = "silo115-guest.example.com"

        [environments.S116]
        survey_url_default_domain = "silo116-guest.example.com"

        [environments.template]
        template = true
        survey_url_default_domain = "siloXXX-guest.example.com"
    "#;

    fn server() -> HttpServer {
        HttpServer::new(&parse_config(CONFIG).unwrap())
    }

    async fn get(server: &HttpServer, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        server.app().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = get(&server(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await["status"], "operational");
    }

    #[tokio::test]
    async fn test_config_defaults_without_selector() {
        let body = body_json(get(&server(), "/config").await).await;
        assert_eq!(body["environment"], "S115");
        assert_eq!(body["config"]["survey_url_default_domain"], "silo115-guest.example.com");
    }

    #[tokio::test]
    async fn test_config_from_selector() {
        let body = body_json(get(&server(), "/config?environment=S116").await).await;
        assert_eq!(body["environment"], "S116");
        assert_eq!(body["config"]["survey_url_default_domain"], "silo116-guest.example.com");
    }

    #[tokio::test]
    async fn test_alias_rewritten_before_routing() {
        let body = body_json(get(&server(), "/config?environment=staging").await).await;
        assert_eq!(body["environment"], "S116");
    }

    #[tokio::test]
    async fn test_template_synthesis() {
        let body = body_json(get(&server(), "/config/S42").await).await;
        assert_eq!(body["environment"], "S42");
        assert_eq!(body["config"]["survey_url_default_domain"], "silo42-guest.example.com");

        let body = body_json(get(&server(), "/config/domain?environment=S7").await).await;
        assert_eq!(body["domain"], "silo7-guest.example.com");
    }

    #[tokio::test]
    async fn test_environment_listing() {
        let body = body_json(get(&server(), "/environments?environment=S116").await).await;
        assert_eq!(body["environments"], serde_json::json!(["S115", "S116", "template"]));
        assert_eq!(body["default"], "S115");
        assert_eq!(body["template"], "template");
        assert_eq!(body["current"], "S116");
    }

    #[tokio::test]
    async fn test_unknown_environment_is_bad_request() {
        let config = parse_config(
            r#"
            [environments.S115]
            survey_url_default_domain = "silo115-guest.example.com"
            "#,
        )
        .unwrap();
        let server = HttpServer::new(&config);

        let response = get(&server, "/config/S999").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "Failed to find configuration for environment S999");

        let response = get(&server, "/config").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
