//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_SITE: &str = "root";

// OData surface
pub const ODATA_ROOT: &str = "/odata";
pub const ODATA_VERSION: &str = "4.0";
pub const SCHEMA_NAMESPACE: &str = "WorkbookOData";
pub const ENTITY_CONTAINER: &str = "Container";
pub const ENTITY_TYPE: &str = "ExcelRow";
pub const ENTITY_SET: &str = "ExcelRow";
pub const ENTITY_KEY: &str = "id";
