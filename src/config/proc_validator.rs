//! Configuration validation with aggregated errors.
//! - Aggregates all hard issues into Vec<String>
//! - Identity credentials are soft: missing ones are only warned about, the
//!   service still starts and reports a configuration error per request

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::service::{AuthConfig, IdentityConfig, ServiceConfig, WorkbookConfig};
use crate::config::settings::SettingsConfig;
use crate::sources::oauth2::ClientCredentials;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_identity(&cfg.identity, &mut errors);
    validate_workbook(&cfg.workbook, &mut errors);
    validate_auth(&cfg.auth, &mut errors);

    if errors.is_empty() {
        info!("config validation passed");
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.trim().parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port number",
            settings.server.port
        ));
    }

    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if EnvFilter::try_new(&logging.level).is_err() {
            errors.push(format!(
                "settings.logging.level '{}' is not a valid level or filter directive",
                logging.level
            ));
        }
    }

    if settings.upstream_timeout_ms == Some(0) {
        errors.push("settings.upstream_timeout_ms must be greater than 0".to_string());
    }
}

fn validate_identity(identity: &IdentityConfig, errors: &mut Vec<String>) {
    validate_url("identity.authority_url", &identity.authority_url, errors);
    if identity.scope.trim().is_empty() {
        errors.push("identity.scope must not be empty".to_string());
    }

    let missing = ClientCredentials::from(identity).missing_fields();
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            "identity credentials not configured; workbook access will fail until they are set"
        );
    }
}

fn validate_workbook(workbook: &WorkbookConfig, errors: &mut Vec<String>) {
    validate_url("workbook.graph_url", &workbook.graph_url, errors);
    if workbook.site.trim().is_empty() {
        errors.push("workbook.site must not be empty".to_string());
    }
    if workbook.file_path.trim().is_empty() {
        errors.push("workbook.file_path must not be empty".to_string());
    }
    if workbook.table_name.trim().is_empty() {
        errors.push("workbook.table_name must not be empty".to_string());
    } else if workbook.table_name.contains('/') {
        errors.push(format!(
            "workbook.table_name '{}' must not contain '/'",
            workbook.table_name
        ));
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    let token = auth.bearer_token();
    if token.trim().is_empty() {
        errors.push("auth.bearer_token must be set (e.g. via API_BEARER_TOKEN)".to_string());
    } else if token.chars().any(char::is_whitespace) {
        // never echo the secret itself
        errors.push("auth.bearer_token must not contain whitespace".to_string());
    }
}

fn validate_url(path: &str, url: &str, errors: &mut Vec<String>) {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("{} '{}' must be an http(s) URL", path, url));
    }
}
