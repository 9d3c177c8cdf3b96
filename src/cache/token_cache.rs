use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::token::AccessToken;
use crate::error::ServiceError;
use crate::helpers::time::Clock;
use crate::observability::metrics::get_metrics;
use crate::sources::oauth2::{ClientCredentials, TokenExchange};

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";

/// Single-slot cache for the upstream access token.
///
/// The slot is replaced only after a successful exchange. Refreshes are
/// single-flight: callers that find the slot empty or expired queue on
/// `refresh` and re-check the slot once they hold it, so a burst of requests
/// on an expired token produces one exchange.
#[derive(Debug)]
pub struct TokenCache {
    slot: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
    exchanger: Arc<dyn TokenExchange>,
    clock: Arc<dyn Clock>,
    safety_margin_seconds: i64,
}

impl TokenCache {
    pub fn new(exchanger: Arc<dyn TokenExchange>, clock: Arc<dyn Clock>, safety_margin_seconds: u64) -> Self {
        Self {
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            exchanger,
            clock,
            safety_margin_seconds: safety_margin_seconds as i64,
        }
    }

    /// Return a usable token, exchanging credentials only when none is cached.
    pub async fn acquire(&self, credentials: &ClientCredentials) -> Result<AccessToken, ServiceError> {
        if let Some(token) = self.usable().await {
            debug!("using cached access token");
            get_metrics().await.token_cache_hits.inc();
            return Ok(token);
        }

        let _in_flight = self.refresh.lock().await;

        // another caller may have refreshed while we were queued
        if let Some(token) = self.usable().await {
            debug!("using access token refreshed by a concurrent request");
            get_metrics().await.token_cache_hits.inc();
            return Ok(token);
        }

        credentials.ensure_complete()?;

        info!("requesting new access token from identity provider");
        let metrics = get_metrics().await;
        let grant = self.exchanger.exchange(credentials).await.inspect_err(|_| {
            metrics.token_exchanges.with_label_values(&[ERROR_MSG]).inc();
        })?;
        metrics.token_exchanges.with_label_values(&[SUCCESS_MSG]).inc();

        let token = AccessToken::from_lifetime(
            grant.access_token,
            self.clock.now_unix(),
            grant.expires_in,
            self.safety_margin_seconds,
        );
        info!(expires_at = token.expires_at, "obtained access token");
        *self.slot.write().await = Some(token.clone());

        Ok(token)
    }

    /// Current snapshot, expired or not, without refreshing.
    pub async fn cached(&self) -> Option<AccessToken> {
        self.slot.read().await.clone()
    }

    /// Drop the cached token; the next `acquire` performs an exchange.
    pub async fn reset(&self) {
        *self.slot.write().await = None;
    }

    async fn usable(&self) -> Option<AccessToken> {
        let now = self.clock.now_unix();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_usable(now))
            .cloned()
    }
}
