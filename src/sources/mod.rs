//! Upstream credential sources.

pub mod oauth2;
