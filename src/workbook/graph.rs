use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cache::token_cache::TokenCache;
use crate::error::ServiceError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sources::oauth2::ClientCredentials;
use crate::workbook::types::{CellValue, Column, Row};
use crate::workbook::{TableFetcher, TableLocator};

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";
static NOT_FOUND_MSG: &str = "not_found";

const OP_COLUMNS: &str = "list_columns";
const OP_ROWS: &str = "list_rows";
const OP_ROW: &str = "get_row";

/// Graph error codes that `itemAt(index=N)` answers with for an index past the end.
const ROW_NOT_FOUND_CODES: [&str; 2] = ["InvalidArgument", "ItemNotFound"];

#[derive(Debug, Deserialize)]
struct GraphCollection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphColumn {
    name: String,
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GraphRow {
    /// a table row is a 1 x N range: `[[v0, v1, ...]]`
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GraphRow {
    fn into_row(self, ordinal_index: u64) -> Row {
        let values = self
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(CellValue::from)
            .collect();
        Row::new(ordinal_index, values)
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    #[serde(default)]
    code: String,
}

/// [`TableFetcher`] over the Microsoft Graph workbook API.
#[derive(Debug)]
pub struct GraphTableFetcher {
    client: Client,
    graph_url: String,
    token_cache: Arc<TokenCache>,
    credentials: ClientCredentials,
}

impl GraphTableFetcher {
    pub fn new(client: Client, graph_url: &str, token_cache: Arc<TokenCache>, credentials: ClientCredentials) -> Self {
        Self {
            client,
            graph_url: graph_url.trim_end_matches('/').to_owned(),
            token_cache,
            credentials,
        }
    }

    pub fn table_url(&self, table: &TableLocator) -> String {
        format!(
            "{}/sites/{}/drive/root:/{}:/workbook/tables/{}",
            self.graph_url, table.site, table.file_path, table.table_name
        )
    }

    /// Authenticated GET; any HTTP status is returned to the caller.
    async fn send(&self, operation: &str, url: &str) -> Result<Response, ServiceError> {
        let token = self.token_cache.acquire(&self.credentials).await?;
        let metrics = get_metrics().await;
        let start = get_instant();

        debug!(operation, url, "graph request");
        let result = self
            .client
            .get(url)
            .bearer_auth(&token.value)
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await;
        metrics
            .upstream_duration
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());

        result.map_err(|e| {
            metrics.upstream_requests.with_label_values(&[operation, ERROR_MSG]).inc();
            error!(operation, error = %e, "graph request could not be sent");
            ServiceError::UpstreamData(format!("{operation}: {e}"))
        })
    }

    async fn read_success<T: DeserializeOwned>(&self, operation: &str, response: Response) -> Result<T, ServiceError> {
        let metrics = get_metrics().await;
        let status = response.status();
        if !status.is_success() {
            metrics.upstream_requests.with_label_values(&[operation, ERROR_MSG]).inc();
            let body = response.text().await.unwrap_or_default();
            error!(operation, status = %status, response = %body, "graph request failed");
            return Err(ServiceError::UpstreamData(format!("{operation}: status {status}")));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            metrics.upstream_requests.with_label_values(&[operation, ERROR_MSG]).inc();
            error!(operation, error = %e, "graph response could not be decoded");
            ServiceError::UpstreamData(format!("{operation}: {e}"))
        })?;
        metrics.upstream_requests.with_label_values(&[operation, SUCCESS_MSG]).inc();
        Ok(parsed)
    }

    async fn fetch_columns(&self, table: &TableLocator) -> Result<Vec<Column>, ServiceError> {
        let url = format!("{}/columns", self.table_url(table));
        let response = self.send(OP_COLUMNS, &url).await?;
        let page: GraphCollection<GraphColumn> = self.read_success(OP_COLUMNS, response).await?;

        let columns: Vec<Column> = page
            .value
            .into_iter()
            .enumerate()
            .map(|(position, column)| Column::new(column.name, column.index.unwrap_or(position)))
            .collect();
        info!(table = %table.table_name, columns = columns.len(), "fetched table columns");
        Ok(columns)
    }

    async fn fetch_rows(&self, table: &TableLocator) -> Result<Vec<Row>, ServiceError> {
        let mut rows = Vec::new();
        let mut next_url = Some(format!("{}/rows", self.table_url(table)));
        let mut visited = HashSet::new();
        let mut page_no = 0;

        while let Some(url) = next_url.take() {
            if !visited.insert(url.clone()) {
                get_metrics().await.upstream_requests.with_label_values(&[OP_ROWS, ERROR_MSG]).inc();
                error!(url = %url, pages = page_no, "graph paging revisits a page");
                return Err(ServiceError::UpstreamData(format!("{OP_ROWS}: nextLink cycle after {page_no} pages")));
            }
            page_no += 1;
            let response = self.send(OP_ROWS, &url).await?;
            let page: GraphCollection<GraphRow> = self.read_success(OP_ROWS, response).await?;
            debug!(page = page_no, rows = page.value.len(), "fetched rows page");

            for graph_row in page.value {
                let ordinal = rows.len() as u64;
                rows.push(graph_row.into_row(ordinal));
            }
            next_url = page.next_link;
        }

        info!(table = %table.table_name, rows = rows.len(), pages = page_no, "fetched table rows");
        Ok(rows)
    }

    async fn fetch_row(&self, table: &TableLocator, ordinal: u64) -> Result<Option<Row>, ServiceError> {
        let url = format!("{}/rows/itemAt(index={})", self.table_url(table), ordinal);
        let response = self.send(OP_ROW, &url).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if is_row_not_found(status, &body) {
                get_metrics()
                    .await
                    .upstream_requests
                    .with_label_values(&[OP_ROW, NOT_FOUND_MSG])
                    .inc();
                debug!(ordinal, "row not found");
                return Ok(None);
            }
            get_metrics()
                .await
                .upstream_requests
                .with_label_values(&[OP_ROW, ERROR_MSG])
                .inc();
            error!(operation = OP_ROW, status = %status, response = %body, "graph request failed");
            return Err(ServiceError::UpstreamData(format!("{OP_ROW}: status {status}")));
        }

        let graph_row: GraphRow = self.read_success(OP_ROW, response).await?;
        Ok(Some(graph_row.into_row(ordinal)))
    }
}

fn is_row_not_found(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }
    serde_json::from_str::<GraphErrorBody>(body)
        .map(|parsed| ROW_NOT_FOUND_CODES.contains(&parsed.error.code.as_str()))
        .unwrap_or(false)
}

impl TableFetcher for GraphTableFetcher {
    fn list_columns<'a>(&'a self, table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Column>, ServiceError>> {
        Box::pin(self.fetch_columns(table))
    }

    fn list_rows<'a>(&'a self, table: &'a TableLocator) -> BoxFuture<'a, Result<Vec<Row>, ServiceError>> {
        Box::pin(self.fetch_rows(table))
    }

    fn get_row<'a>(
        &'a self,
        table: &'a TableLocator,
        ordinal: u64,
    ) -> BoxFuture<'a, Result<Option<Row>, ServiceError>> {
        Box::pin(self.fetch_row(table, ordinal))
    }
}
