use std::fmt::Debug;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::service::IdentityConfig;
use crate::error::ServiceError;

/// Client-credentials grant inputs. Any of the identifiers may be missing
/// when the service was started without them.
#[derive(Debug, Clone, Default)]
pub struct ClientCredentials {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: String,
}

impl ClientCredentials {
    /// Names of the required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.tenant_id) {
            missing.push("tenant_id");
        }
        if is_blank(&self.client_id) {
            missing.push("client_id");
        }
        if is_blank(&self.client_secret) {
            missing.push("client_secret");
        }
        missing
    }

    pub fn ensure_complete(&self) -> Result<(), ServiceError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Configuration(format!(
                "missing identity credentials: {}",
                missing.join(", ")
            )))
        }
    }
}

impl From<&IdentityConfig> for ClientCredentials {
    fn from(cfg: &IdentityConfig) -> Self {
        Self {
            tenant_id: cfg.tenant_id.to_owned(),
            client_id: cfg.client_id.to_owned(),
            client_secret: cfg.client_secret.to_owned(),
            scope: cfg.scope.to_owned(),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}

/// Successful token endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// lifetime in seconds, counted from the moment of the response
    pub expires_in: i64,
}

/// One credential exchange against the identity provider.
///
/// Implementations log the real cause of a failure and return
/// [`ServiceError::UpstreamAuth`].
pub trait TokenExchange: Debug + Send + Sync {
    fn exchange<'a>(
        &'a self,
        credentials: &'a ClientCredentials,
    ) -> BoxFuture<'a, Result<TokenGrant, ServiceError>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Value,
}

/// Client-credentials exchange over HTTP (`{authority}/{tenant}/oauth2/v2.0/token`).
#[derive(Debug, Clone)]
pub struct OAuth2Exchanger {
    client: Client,
    authority_url: String,
}

impl OAuth2Exchanger {
    pub fn new(client: Client, authority_url: &str) -> Self {
        Self {
            client,
            authority_url: authority_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn token_endpoint(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_url, tenant_id)
    }

    async fn request_token(&self, credentials: &ClientCredentials) -> Result<TokenGrant, ServiceError> {
        credentials.ensure_complete()?;
        let tenant_id = credentials.tenant_id.as_deref().unwrap_or_default();
        let form = [
            ("client_id", credentials.client_id.as_deref().unwrap_or_default()),
            ("client_secret", credentials.client_secret.as_deref().unwrap_or_default()),
            ("scope", credentials.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let url = self.token_endpoint(tenant_id);
        debug!(url = %url, "requesting access token");
        let response = self.client.post(&url).form(&form[..]).send().await.map_err(|e| {
            error!(error = %e, "token request could not be sent");
            ServiceError::UpstreamAuth
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, response = %body, "token request rejected by identity provider");
            return Err(ServiceError::UpstreamAuth);
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "token response is not valid JSON");
            ServiceError::UpstreamAuth
        })?;
        let expires_in = parse_expires_in(&parsed.expires_in).ok_or_else(|| {
            error!(expires_in = %parsed.expires_in, "token response has no usable expires_in");
            ServiceError::UpstreamAuth
        })?;

        Ok(TokenGrant {
            access_token: parsed.access_token,
            expires_in,
        })
    }
}

impl TokenExchange for OAuth2Exchanger {
    fn exchange<'a>(
        &'a self,
        credentials: &'a ClientCredentials,
    ) -> BoxFuture<'a, Result<TokenGrant, ServiceError>> {
        Box::pin(self.request_token(credentials))
    }
}

/// `expires_in` arrives as a number from v2 endpoints and as a string from some v1 ones.
fn parse_expires_in(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
