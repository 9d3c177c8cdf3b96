use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::odata::entity::{translate, ODataEntity};
use crate::workbook::types::Column;
use crate::workbook::{TableFetcher, TableLocator};

/// Column metadata lifecycle.
///
/// `Failed` keeps the last error for health reporting and is retried exactly
/// like `Uninitialized`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnState {
    Uninitialized,
    Loading,
    Ready(Arc<Vec<Column>>),
    Failed { reason: String },
}

impl ColumnState {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnState::Uninitialized => "uninitialized",
            ColumnState::Loading => "loading",
            ColumnState::Ready(_) => "ready",
            ColumnState::Failed { .. } => "failed",
        }
    }

    fn ready(&self) -> Option<Arc<Vec<Column>>> {
        match self {
            ColumnState::Ready(columns) => Some(columns.clone()),
            _ => None,
        }
    }
}

/// Serves the entity set of one workbook table.
///
/// Rows are fetched on every call; only the column list is kept.
#[derive(Debug)]
pub struct EntityResolver {
    fetcher: Arc<dyn TableFetcher>,
    table: TableLocator,
    state: RwLock<ColumnState>,
    init: Mutex<()>,
}

impl EntityResolver {
    pub fn new(fetcher: Arc<dyn TableFetcher>, table: TableLocator) -> Self {
        Self {
            fetcher,
            table,
            state: RwLock::new(ColumnState::Uninitialized),
            init: Mutex::new(()),
        }
    }

    /// Build the resolver and try to load columns once. A failure is logged
    /// and left for the next request to retry.
    pub async fn start(fetcher: Arc<dyn TableFetcher>, table: TableLocator) -> Arc<Self> {
        let resolver = Arc::new(Self::new(fetcher, table));
        if let Err(e) = resolver.columns().await {
            warn!(table = %resolver.table.table_name, error = %e, "column initialization failed, will retry on next request");
        }
        resolver
    }

    pub fn table(&self) -> &TableLocator {
        &self.table
    }

    pub async fn column_state(&self) -> ColumnState {
        self.state.read().await.clone()
    }

    /// Column list, loading it first if it is not ready. Concurrent callers
    /// share one load.
    pub async fn columns(&self) -> Result<Arc<Vec<Column>>, ServiceError> {
        if let Some(columns) = self.state.read().await.ready() {
            return Ok(columns);
        }

        let _in_flight = self.init.lock().await;
        if let Some(columns) = self.state.read().await.ready() {
            return Ok(columns);
        }

        *self.state.write().await = ColumnState::Loading;
        match self.fetcher.list_columns(&self.table).await {
            Ok(columns) => {
                info!(
                    file = %self.table.file_path,
                    table = %self.table.table_name,
                    columns = columns.len(),
                    "initialized table columns"
                );
                let columns = Arc::new(columns);
                *self.state.write().await = ColumnState::Ready(columns.clone());
                Ok(columns)
            }
            Err(e) => {
                *self.state.write().await = ColumnState::Failed { reason: e.to_string() };
                Err(e)
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<ODataEntity>, ServiceError> {
        let columns = self.columns().await?;
        let rows = self.fetcher.list_rows(&self.table).await?;
        debug!(rows = rows.len(), "translating rows");
        Ok(translate(&rows, &columns))
    }

    pub async fn get_by_key(&self, key: &str) -> Result<ODataEntity, ServiceError> {
        let ordinal = parse_key(key)?;
        let columns = self.columns().await?;

        let row = self
            .fetcher
            .get_row(&self.table, ordinal)
            .await?
            .ok_or_else(|| ServiceError::NotFound(key.to_owned()))?;

        // a row with no values still translates to `{ id }`
        translate(std::slice::from_ref(&row), &columns)
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(key.to_owned()))
    }
}

/// Keys are decimal row ordinals. Digits that overflow cannot address a row
/// and are reported as not found rather than malformed.
fn parse_key(key: &str) -> Result<u64, ServiceError> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidKey(key.to_owned()));
    }
    key.parse::<u64>()
        .map_err(|_| ServiceError::NotFound(key.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_must_be_plain_digits() {
        assert_eq!(parse_key("2"), Ok(2));
        assert_eq!(parse_key("007"), Ok(7));
        assert_eq!(parse_key("abc"), Err(ServiceError::InvalidKey("abc".into())));
        assert_eq!(parse_key(""), Err(ServiceError::InvalidKey("".into())));
        assert_eq!(parse_key("-1"), Err(ServiceError::InvalidKey("-1".into())));
        assert_eq!(parse_key("+1"), Err(ServiceError::InvalidKey("+1".into())));
        assert_eq!(parse_key("2abc"), Err(ServiceError::InvalidKey("2abc".into())));
        assert_eq!(parse_key(" 2"), Err(ServiceError::InvalidKey(" 2".into())));
    }

    #[test]
    fn overflowing_key_is_not_found() {
        let key = "99999999999999999999999";
        assert_eq!(parse_key(key), Err(ServiceError::NotFound(key.into())));
    }

    #[test]
    fn state_labels() {
        assert_eq!(ColumnState::Uninitialized.label(), "uninitialized");
        assert_eq!(ColumnState::Failed { reason: "x".into() }.label(), "failed");
        assert_eq!(ColumnState::Ready(Arc::new(vec![])).label(), "ready");
    }
}
