use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::server::server::AppState;
use crate::utils::constants::{ENTITY_SET, ODATA_ROOT};

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
    endpoints: Endpoints,
}

#[derive(Serialize)]
struct Endpoints {
    odata: String,
    metadata: String,
    entity_set: String,
    health: &'static str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    columns: &'static str,
    upstream_token: &'static str,
}

/// Unauthenticated informational routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        endpoints: Endpoints {
            odata: ODATA_ROOT.to_owned(),
            metadata: format!("{ODATA_ROOT}/$metadata"),
            entity_set: format!("{ODATA_ROOT}/{ENTITY_SET}"),
            health: "/health",
        },
    })
}

/// Liveness plus a view of the two lazily filled caches. Always 200: a failed
/// column load heals on the next OData request.
async fn health(State(state): State<AppState>) -> Json<Health> {
    // failure reasons stay in the logs; this route is unauthenticated
    let columns = state.resolver.column_state().await;
    let upstream_token = if state.token_cache.cached().await.is_some() { "cached" } else { "absent" };

    Json(Health {
        status: "ok",
        columns: columns.label(),
        upstream_token,
    })
}
