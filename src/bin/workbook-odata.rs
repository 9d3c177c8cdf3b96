use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};

use workbook_odata::cache::token_cache::TokenCache;
use workbook_odata::helpers::time::SystemClock;
use workbook_odata::observability::metrics::get_metrics;
use workbook_odata::odata::resolver::EntityResolver;
use workbook_odata::security::bearer_gate::BearerGate;
use workbook_odata::server::server::{self, AppState};
use workbook_odata::sources::oauth2::{ClientCredentials, OAuth2Exchanger};
use workbook_odata::utils::config_loader;
use workbook_odata::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS};
use workbook_odata::utils::logging::{self, LogLevel};
use workbook_odata::workbook::graph::GraphTableFetcher;
use workbook_odata::workbook::TableLocator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "workbook-odata.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);
    let settings = &service_config.settings;

    // -------------------------------
    // 2. Upstream clients
    // -------------------------------

    let timeout_ms = settings.upstream_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
    let client = Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .context("cannot build HTTP client")?;

    let exchanger = Arc::new(OAuth2Exchanger::new(client.clone(), &service_config.identity.authority_url));
    let token_cache = Arc::new(TokenCache::new(
        exchanger,
        Arc::new(SystemClock),
        settings.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS),
    ));
    let credentials = ClientCredentials::from(&service_config.identity);
    let fetcher = Arc::new(GraphTableFetcher::new(
        client,
        &service_config.workbook.graph_url,
        token_cache.clone(),
        credentials.clone(),
    ));

    // -------------------------------
    // 3. Probe upstream authentication once
    // -------------------------------

    match token_cache.acquire(&credentials).await {
        Ok(_) => info!("upstream authentication succeeded"),
        Err(e) => warn!(error = %e, "upstream authentication failed; SharePoint access will not work until configured"),
    }

    // -------------------------------
    // 4. Column metadata, inbound gate
    // -------------------------------

    let resolver = EntityResolver::start(fetcher, TableLocator::from(&service_config.workbook)).await;
    let gate = BearerGate::new(service_config.auth.bearer_token());

    // -------------------------------
    // 5. Serve
    // -------------------------------

    let state = AppState::new(get_metrics().await, gate, resolver, token_cache);
    info!(
        file = %service_config.workbook.file_path,
        table = %service_config.workbook.table_name,
        "Service starting..."
    );
    server::start(settings, state).await
}
