//! Remote workbook access.
//!
//! The resolver only depends on [`TableFetcher`]; [`graph::GraphTableFetcher`]
//! is the Microsoft Graph implementation.

pub mod graph;
pub mod types;

use std::fmt::Debug;

use futures::future::BoxFuture;

use crate::config::service::WorkbookConfig;
use crate::error::ServiceError;
use types::{Column, Row};

/// Names the one table served by this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocator {
    pub site: String,
    pub file_path: String,
    pub table_name: String,
}

impl From<&WorkbookConfig> for TableLocator {
    fn from(cfg: &WorkbookConfig) -> Self {
        Self {
            site: cfg.site.to_owned(),
            file_path: cfg.file_path.trim_matches('/').to_owned(),
            table_name: cfg.table_name.to_owned(),
        }
    }
}

/// Reads columns and rows of a workbook table.
///
/// Failures come back as `Configuration`/`UpstreamAuth` (token) or
/// `UpstreamData` (everything else). Nothing is retried here.
pub trait TableFetcher: Debug + Send + Sync {
    fn list_columns<'a>(&'a self, table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Column>, ServiceError>>;

    fn list_rows<'a>(&'a self, table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Row>, ServiceError>>;

    /// `Ok(None)` when the table has no row at `ordinal`.
    fn get_row<'a>(
        &'a self,
        table: &'a TableLocator,
        ordinal: u64,
    ) -> BoxFuture<'a, Result<Option<Row>, ServiceError>>;
}
