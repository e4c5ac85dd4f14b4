//! Outbound environment propagation.
//!
//! # Responsibilities
//! - Attach `?environment=` to requests sent to downstream services
//! - Source the value from an explicit override, else from the current context
//!
//! # Design Decisions
//! - Empty values count as unset; when nothing is set no parameter is added
//! - Existing query parameters are kept; the selector is appended
//! - Two front ends: a tower layer for `http::Request` clients and an
//!   extension trait for `reqwest::RequestBuilder`

use std::task::{Context, Poll};

use axum::http::Request;
use tower::{Layer, Service};

use crate::context;
use crate::http::query::{append_query_param, ENVIRONMENT_PARAM};

/// The environment to send downstream: `fixed` if non-empty, else the
/// non-empty current environment.
pub fn outbound_environment(fixed: Option<&str>) -> Option<String> {
    match fixed {
        Some(environment) if !environment.is_empty() => Some(environment.to_string()),
        _ => context::current().filter(|environment| !environment.is_empty()),
    }
}

/// Layer adding the environment selector to outgoing requests.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentPropagationLayer {
    environment: Option<String>,
}

impl EnvironmentPropagationLayer {
    /// Propagate whatever environment the current request runs under.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always send `environment`, regardless of the current context.
    pub fn fixed(environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
        }
    }
}

impl<S> Layer<S> for EnvironmentPropagationLayer {
    type Service = EnvironmentPropagation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnvironmentPropagation {
            inner,
            environment: self.environment.clone(),
        }
    }
}

/// Service produced by [`EnvironmentPropagationLayer`].
#[derive(Clone, Debug)]
pub struct EnvironmentPropagation<S> {
    inner: S,
    environment: Option<String>,
}

impl<S, B> Service<Request<B>> for EnvironmentPropagation<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        if let Some(environment) = outbound_environment(self.environment.as_deref()) {
            match append_query_param(request.uri(), ENVIRONMENT_PARAM, &environment) {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => {
                    tracing::warn!(environment = %environment, error = %e, "Failed to propagate environment");
                }
            }
        }
        self.inner.call(request)
    }
}

/// Adds the environment selector to `reqwest` requests.
pub trait PropagateEnvironment {
    /// Append `?environment=` from `fixed` or the current context.
    fn propagate_environment(self, fixed: Option<&str>) -> Self;
}

impl PropagateEnvironment for reqwest::RequestBuilder {
    fn propagate_environment(self, fixed: Option<&str>) -> Self {
        match outbound_environment(fixed) {
            Some(environment) => self.query(&[(ENVIRONMENT_PARAM, environment)]),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    async fn send(layer: EnvironmentPropagationLayer, uri: &str) -> String {
        let service = layer.layer(service_fn(|request: Request<()>| async move {
            Ok::<_, Infallible>(request.uri().to_string())
        }));
        let request = Request::builder().uri(uri).body(()).unwrap();
        service.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_context_propagated() {
        let uri = context::scope(
            Some("S116".into()),
            send(EnvironmentPropagationLayer::new(), "http://svc.internal/items?page=2"),
        )
        .await;
        assert_eq!(uri, "http://svc.internal/items?page=2&environment=S116");
    }

    #[tokio::test]
    async fn test_fixed_overrides_context() {
        let uri = context::scope(
            Some("S116".into()),
            send(EnvironmentPropagationLayer::fixed("S115"), "http://svc.internal/items"),
        )
        .await;
        assert_eq!(uri, "http://svc.internal/items?environment=S115");
    }

    #[tokio::test]
    async fn test_nothing_set_adds_nothing() {
        let uri = send(EnvironmentPropagationLayer::new(), "http://svc.internal/items").await;
        assert_eq!(uri, "http://svc.internal/items");

        let uri = context::scope(
            Some(String::new()),
            send(EnvironmentPropagationLayer::fixed(""), "http://svc.internal/items"),
        )
        .await;
        assert_eq!(uri, "http://svc.internal/items");
    }

    #[test]
    fn test_outbound_environment() {
        assert_eq!(outbound_environment(Some("S1")).as_deref(), Some("S1"));
        assert_eq!(outbound_environment(None), None);
        let _guard = context::enter("S2");
        assert_eq!(outbound_environment(None).as_deref(), Some("S2"));
        assert_eq!(outbound_environment(Some("")).as_deref(), Some("S2"));
    }

    #[test]
    fn test_reqwest_builder() {
        let client = reqwest::Client::new();
        let request = client
            .get("http://svc.internal/config?x=1")
            .propagate_environment(Some("S117"))
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://svc.internal/config?x=1&environment=S117");

        let request = client
            .get("http://svc.internal/config")
            .propagate_environment(None)
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
    }
}
