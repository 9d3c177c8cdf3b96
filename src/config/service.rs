use serde::Deserialize;
use std::fmt;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{DEFAULT_AUTHORITY_URL, DEFAULT_GRAPH_URL, DEFAULT_SCOPE, DEFAULT_SITE};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    pub workbook: WorkbookConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// ================================
/// Upstream identity provider (client-credentials)
/// ================================
#[derive(Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
    /// missing credentials do not stop the service; token requests fail instead
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            authority_url: default_authority_url(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            scope: default_scope(),
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("authority_url", &self.authority_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// ================================
/// Workbook table location
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct WorkbookConfig {
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    #[serde(default = "default_site")]
    pub site: String,
    /// drive-relative path, e.g. `Documents/data.xlsx`
    pub file_path: String,
    pub table_name: String,
}

/// ================================
/// Inbound static bearer token
/// ================================
#[derive(Deserialize, Clone, Default)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

impl AuthConfig {
    pub fn bearer_token(&self) -> &str {
        self.bearer_token.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_site() -> String {
    DEFAULT_SITE.to_string()
}
