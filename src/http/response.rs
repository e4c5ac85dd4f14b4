//! Error responses for failed environment resolution.
//!
//! # Design Decisions
//! - Every resolution failure is a client error (400); none are retried
//! - Payload is `{code, message, details?}`, `details` omitted when absent

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::registry::EnvironmentError;

/// Status returned for any configuration-resolution failure.
pub const RESOLUTION_FAILURE_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&EnvironmentError> for ErrorMessage {
    fn from(error: &EnvironmentError) -> Self {
        match error {
            EnvironmentError::TemplateResolution { key, source } => ErrorMessage::new(
                RESOLUTION_FAILURE_STATUS,
                format!("Failed to resolve template for environment {key}"),
            )
            .with_details(source.to_string()),
            other => ErrorMessage::new(RESOLUTION_FAILURE_STATUS, other.to_string()),
        }
    }
}

impl IntoResponse for EnvironmentError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Environment resolution failed");
        (RESOLUTION_FAILURE_STATUS, Json(ErrorMessage::from(&self))).into_response()
    }
}
