//! # Workbook OData Library
//!
//! Exposes one Excel table stored in SharePoint as a read-only OData V4
//! entity set, gated by a static bearer token.
//!
//! Modules:
//! - `config`: YAML service configuration, defaults and validation
//! - `cache`: upstream access token and its single-slot cache
//! - `sources`: client-credentials exchange with the identity provider
//! - `workbook`: table column and row access over Microsoft Graph
//! - `odata`: row translation, CSDL metadata, entity resolution and routes
//! - `security`: inbound bearer token gate
//! - `server`: axum application state and server lifecycle

pub mod config;
pub mod cache;
pub mod sources;
pub mod workbook;
pub mod odata;
pub mod security;
pub mod error;
pub mod observability;
pub mod server;
pub mod helpers;
pub mod utils;
#[cfg(test)]
pub mod tests;

pub use crate::config::service::ServiceConfig;
pub use crate::error::ServiceError;
