use crate::config::service::ServiceConfig;
use crate::config::settings::LoggingConfig;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS};

/// Fill optional settings and normalize values read from the file or the environment.
pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    if config.settings.logging.is_none() {
        config.settings.logging = Some(LoggingConfig::default());
    }
    if config.settings.safety_margin_seconds.is_none() {
        config.settings.safety_margin_seconds = Some(DEFAULT_SAFETY_MARGIN_SECS);
    }
    if config.settings.upstream_timeout_ms.is_none() {
        config.settings.upstream_timeout_ms = Some(DEFAULT_HTTP_TIMEOUT_MS);
    }

    // env placeholders expand to "" when unset; treat blank the same as absent
    let identity = &mut config.identity;
    for field in [&mut identity.tenant_id, &mut identity.client_id, &mut identity.client_secret] {
        *field = field.take().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    }
    config.auth.bearer_token = config.auth.bearer_token.take().filter(|v| !v.trim().is_empty());

    config.identity.authority_url = config.identity.authority_url.trim_end_matches('/').to_owned();
    config.workbook.graph_url = config.workbook.graph_url.trim_end_matches('/').to_owned();
    config.workbook.file_path = config.workbook.file_path.trim().trim_matches('/').to_owned();
    config.workbook.table_name = config.workbook.table_name.trim().to_owned();

    config
}
