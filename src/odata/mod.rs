//! Tabular rows as OData entities: translation, lookup and `$metadata`.

pub mod entity;
pub mod metadata;
pub mod resolver;
pub mod routes;
