//! Inbound environment selection.
//! Scopes every request to the environment named in its query string.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::context;
use crate::http::query::{first_query_param, ENVIRONMENT_PARAM};

/// Selector attached to requests by [`environment_middleware`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestEnvironment(pub Option<String>);

impl RequestEnvironment {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Read `?environment=` and make it the current environment while the rest of
/// the stack handles the request.
///
/// The context scope ends with the response future, so the selector never
/// outlives its request even when the handler fails.
pub async fn environment_middleware(mut request: Request, next: Next) -> Response {
    let selector = first_query_param(request.uri(), ENVIRONMENT_PARAM);
    tracing::debug!(environment = ?selector, path = %request.uri().path(), "Scoping request environment");

    request
        .extensions_mut()
        .insert(RequestEnvironment(selector.clone()));

    context::scope(selector, next.run(request)).await
}
