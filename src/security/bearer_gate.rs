use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

const BEARER_SCHEME: &str = "bearer";

/// Why an inbound request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingToken,
    InvalidToken,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingToken => "missing_token",
            Rejection::InvalidToken => "invalid_token",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::MissingToken => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
            Rejection::InvalidToken => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Invalid token" }))).into_response()
            }
        }
    }
}

/// Static bearer token check for inbound callers.
///
/// Unrelated to the upstream token cache: this secret is configured once and
/// compared verbatim.
#[derive(Clone)]
pub struct BearerGate {
    secret: String,
}

impl BearerGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn authorize(&self, header_value: Option<&str>) -> Result<(), Rejection> {
        let mut parts = header_value.unwrap_or_default().split_whitespace();
        let scheme = parts.next();
        let token = parts.next();

        let token = match (scheme, token) {
            (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => token,
            _ => return Err(Rejection::MissingToken),
        };

        if token.as_bytes().ct_eq(self.secret.as_bytes()).into() {
            Ok(())
        } else {
            Err(Rejection::InvalidToken)
        }
    }
}

impl std::fmt::Debug for BearerGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerGate").field("secret", &"<redacted>").finish()
    }
}

/// Axum middleware guarding the OData routes.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.gate.authorize(header_value) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            warn!(reason = rejection.reason(), path = %request.uri().path(), "authentication failed");
            get_metrics()
                .await
                .auth_rejections
                .with_label_values(&[rejection.reason()])
                .inc();
            rejection.into_response()
        }
    }
}
