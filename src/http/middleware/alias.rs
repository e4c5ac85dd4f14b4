//! Pre-routing rewrite of environment aliases.
//!
//! # Responsibilities
//! - Map legacy selector values (`production`, `prod`, `pr01`) to one
//!   canonical environment (`P2`) before the router sees the request
//!
//! # Design Decisions
//! - Wraps the whole router, so the rewrite happens before routing and before
//!   `environment_middleware` reads the selector
//! - Only the first selector value is inspected; all occurrences are replaced

use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Request, Uri};
use tower::{Layer, Service};

use crate::config::AliasRule;
use crate::http::query::{first_query_param, replace_query_param, ENVIRONMENT_PARAM};

/// Layer rewriting `?environment=<alias>` to its canonical environment.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentAliasLayer {
    aliases: Arc<HashMap<String, String>>,
}

impl EnvironmentAliasLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite each of `from` to `canonical`.
    pub fn alias<I, S>(mut self, canonical: &str, from: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases = Arc::make_mut(&mut self.aliases);
        for alias in from {
            aliases.insert(alias.into(), canonical.to_string());
        }
        self
    }

    pub fn from_rules(rules: &[AliasRule]) -> Self {
        rules
            .iter()
            .fold(Self::new(), |layer, rule| layer.alias(&rule.canonical, rule.aliases.iter().cloned()))
    }

    /// Canonical environment for `selector`, if it is an alias.
    pub fn canonical(&self, selector: &str) -> Option<&str> {
        self.aliases.get(selector).map(String::as_str)
    }

    fn rewrite(&self, uri: &Uri) -> Option<Uri> {
        let selector = first_query_param(uri, ENVIRONMENT_PARAM)?;
        let canonical = self.canonical(&selector)?;
        match replace_query_param(uri, ENVIRONMENT_PARAM, canonical) {
            Ok(rewritten) => {
                tracing::debug!(from = %selector, to = %canonical, "Rewrote environment alias");
                Some(rewritten)
            }
            Err(e) => {
                tracing::warn!(from = %selector, error = %e, "Failed to rewrite environment alias");
                None
            }
        }
    }
}

impl<S> Layer<S> for EnvironmentAliasLayer {
    type Service = EnvironmentAlias<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnvironmentAlias {
            inner,
            layer: self.clone(),
        }
    }
}

/// Service produced by [`EnvironmentAliasLayer`].
#[derive(Clone, Debug)]
pub struct EnvironmentAlias<S> {
    inner: S,
    layer: EnvironmentAliasLayer,
}

impl<S, B> Service<Request<B>> for EnvironmentAlias<S>
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
        if let Some(uri) = self.layer.rewrite(request.uri()) {
            *request.uri_mut() = uri;
        }
        self.inner.call(request)
    }
}
