// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;

use crate::cache::token_cache::TokenCache;
use crate::config::settings::MetricsConfig;
use crate::error::ServiceError;
use crate::helpers::time::ManualClock;
use crate::observability::metrics::get_metrics;
use crate::odata::resolver::EntityResolver;
use crate::security::bearer_gate::BearerGate;
use crate::server::server::{build_router, AppState};
use crate::sources::oauth2::{ClientCredentials, TokenExchange, TokenGrant};
use crate::workbook::types::{CellValue, Column, Row};
use crate::workbook::{TableFetcher, TableLocator};

pub const SECRET: &str = "right";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn credentials() -> ClientCredentials {
    ClientCredentials {
        tenant_id: Some("tenant".into()),
        client_id: Some("client".into()),
        client_secret: Some("secret".into()),
        scope: "https://graph.microsoft.com/.default".into(),
    }
}

pub fn table() -> TableLocator {
    TableLocator {
        site: "root".into(),
        file_path: "Documents/data.xlsx".into(),
        table_name: "Table1".into(),
    }
}

/// Token exchange fake: counts calls, optionally slow, optionally failing.
#[derive(Debug)]
pub struct CountingExchange {
    pub calls: AtomicUsize,
    lifetime: i64,
    delay: Duration,
    fail: bool,
}

impl CountingExchange {
    pub fn new(lifetime: i64) -> Self {
        Self { calls: AtomicUsize::new(0), lifetime, delay: Duration::ZERO, fail: false }
    }

    pub fn slow(lifetime: i64, delay: Duration) -> Self {
        Self { delay, ..Self::new(lifetime) }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new(3600) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenExchange for CountingExchange {
    fn exchange<'a>(&'a self, _credentials: &'a ClientCredentials) -> BoxFuture<'a, Result<TokenGrant, ServiceError>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ServiceError::UpstreamAuth);
            }
            Ok(TokenGrant { access_token: format!("token-{n}"), expires_in: self.lifetime })
        })
    }
}

/// In-memory table with call counters. The first `failures` column loads fail.
#[derive(Debug)]
pub struct StubFetcher {
    columns: Vec<Column>,
    rows: Vec<Row>,
    delay: Duration,
    failures: AtomicUsize,
    pub column_loads: AtomicUsize,
}

impl StubFetcher {
    pub fn new(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns: columns.iter().enumerate().map(|(i, name)| Column::new(*name, i)).collect(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, values)| Row::new(i as u64, values))
                .collect(),
            delay: Duration::ZERO,
            failures: AtomicUsize::new(0),
            column_loads: AtomicUsize::new(0),
        }
    }

    /// columns `A,B,C`, rows `[[1,2,3],[4,5,6],[7,8,9]]`
    pub fn abc() -> Self {
        Self::new(
            &["A", "B", "C"],
            vec![
                vec![1.into(), 2.into(), 3.into()],
                vec![4.into(), 5.into(), 6.into()],
                vec![7.into(), 8.into(), 9.into()],
            ],
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn column_loads(&self) -> usize {
        self.column_loads.load(Ordering::SeqCst)
    }
}

impl TableFetcher for StubFetcher {
    fn list_columns<'a>(&'a self, _table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Column>, ServiceError>> {
        Box::pin(async move {
            self.column_loads.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failed {
                return Err(ServiceError::UpstreamData("columns: status 503".into()));
            }
            Ok(self.columns.clone())
        })
    }

    fn list_rows<'a>(&'a self, _table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Row>, ServiceError>> {
        Box::pin(async move { Ok(self.rows.clone()) })
    }

    fn get_row<'a>(
        &'a self,
        _table: &'a TableLocator,
        ordinal: u64,
    ) -> BoxFuture<'a, Result<Option<Row>, ServiceError>> {
        Box::pin(async move { Ok(self.rows.get(ordinal as usize).cloned()) })
    }
}

/// Application state over fakes; the token cache is never touched by `StubFetcher`.
pub async fn stub_state(fetcher: Arc<StubFetcher>) -> AppState {
    let token_cache = Arc::new(TokenCache::new(
        Arc::new(CountingExchange::new(3600)),
        Arc::new(ManualClock::new(1_000)),
        300,
    ));
    let resolver = Arc::new(EntityResolver::new(fetcher, table()));
    AppState::new(get_metrics().await, BearerGate::new(SECRET), resolver, token_cache)
}

pub async fn spawn_app(state: AppState) -> (JoinHandle<()>, String) {
    let metrics_config = MetricsConfig { path: "/metrics".into(), is_enabled: true };
    let (handle, addr) = spawn_axum(build_router(state, &metrics_config)).await;
    (handle, format!("http://{addr}"))
}
