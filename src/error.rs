//! Service error taxonomy and its mapping to OData error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the token cache, the table fetcher and the entity resolver.
///
/// The `Display` text is meant for logs. Response bodies only ever carry
/// [`ServiceError::code`] and [`ServiceError::public_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream authentication failed")]
    UpstreamAuth,

    #[error("upstream data request failed: {0}")]
    UpstreamData(String),

    #[error("invalid entity key '{0}'")]
    InvalidKey(String),

    #[error("entity '{0}' not found")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "ConfigurationError",
            ServiceError::UpstreamAuth => "UpstreamAuthError",
            ServiceError::UpstreamData(_) => "UpstreamDataError",
            ServiceError::InvalidKey(_) => "InvalidKey",
            ServiceError::NotFound(_) => "NotFound",
            ServiceError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Configuration(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::UpstreamAuth | ServiceError::UpstreamData(_) => StatusCode::BAD_GATEWAY,
            ServiceError::InvalidKey(_) | ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Stable, cause-free message per error kind.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "The service is not configured to reach the workbook",
            ServiceError::UpstreamAuth => "Authentication failed",
            ServiceError::UpstreamData(_) => "Failed to read data from the workbook",
            ServiceError::InvalidKey(_) => "The entity key is not a valid row index",
            ServiceError::NotFound(_) => "The requested entity does not exist",
            ServiceError::Internal(_) => "The service could not complete the request",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        debug!(code = self.code(), error = %self, "request failed");
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
