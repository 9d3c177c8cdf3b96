use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::ServiceError;
use crate::observability::metrics::get_metrics;
use crate::odata::entity::ODataEntity;
use crate::odata::metadata::render_metadata;
use crate::security::bearer_gate::require_bearer;
use crate::server::server::AppState;
use crate::utils::constants::{ENTITY_SET, ODATA_ROOT, ODATA_VERSION};

const METADATA_SEGMENT: &str = "$metadata";
const ODATA_VERSION_HEADER: &str = "odata-version";

#[derive(Serialize)]
struct CollectionBody<'a> {
    #[serde(rename = "@odata.context")]
    context: String,
    value: &'a [ODataEntity],
}

#[derive(Serialize)]
struct EntityBody<'a> {
    #[serde(rename = "@odata.context")]
    context: String,
    #[serde(flatten)]
    entity: &'a ODataEntity,
}

/// What a path segment under the OData root addresses.
#[derive(Debug, PartialEq, Eq)]
enum Resource<'a> {
    Metadata,
    Collection,
    Entity(&'a str),
    Unknown,
}

fn parse_segment(segment: &str) -> Resource<'_> {
    if segment == METADATA_SEGMENT {
        return Resource::Metadata;
    }
    if segment == ENTITY_SET {
        return Resource::Collection;
    }
    let key = segment
        .strip_prefix(ENTITY_SET)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'));
    match key {
        Some(key) => {
            let key = key
                .strip_prefix('\'')
                .and_then(|k| k.strip_suffix('\''))
                .unwrap_or(key);
            Resource::Entity(key)
        }
        None => Resource::Unknown,
    }
}

/// OData routes, all behind the bearer gate.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(ODATA_ROOT, get(service_document))
        .route(&format!("{ODATA_ROOT}/{{segment}}"), get(resource))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
}

async fn service_document() -> Response {
    get_metrics().await.odata_requests.with_label_values(&["service_document"]).inc();
    let body = json!({
        "@odata.context": format!("{ODATA_ROOT}/{METADATA_SEGMENT}"),
        "value": [
            { "name": ENTITY_SET, "kind": "EntitySet", "url": ENTITY_SET }
        ]
    });
    odata_response(Json(body))
}

async fn resource(State(state): State<AppState>, Path(segment): Path<String>) -> Response {
    match parse_segment(&segment) {
        Resource::Metadata => metadata().await.unwrap_or_else(IntoResponse::into_response),
        Resource::Collection => collection(&state).await.unwrap_or_else(IntoResponse::into_response),
        Resource::Entity(key) => entity(&state, key).await.unwrap_or_else(IntoResponse::into_response),
        Resource::Unknown => ServiceError::NotFound(segment.to_owned()).into_response(),
    }
}

async fn metadata() -> Result<Response, ServiceError> {
    get_metrics().await.odata_requests.with_label_values(&["metadata"]).inc();
    let xml = render_metadata().map_err(|e| {
        error!(error = %e, "cannot render $metadata");
        ServiceError::Internal(e.to_string())
    })?;
    Ok(odata_response((StatusCode::OK, [(CONTENT_TYPE, "application/xml")], xml)))
}

async fn collection(state: &AppState) -> Result<Response, ServiceError> {
    get_metrics().await.odata_requests.with_label_values(&["list_all"]).inc();
    info!(table = %state.resolver.table().table_name, "OData request: get all rows");
    let entities = state.resolver.list_all().await?;
    let body = CollectionBody {
        context: format!("{ODATA_ROOT}/{METADATA_SEGMENT}#{ENTITY_SET}"),
        value: &entities,
    };
    Ok(odata_response(Json(body)))
}

async fn entity(state: &AppState, key: &str) -> Result<Response, ServiceError> {
    get_metrics().await.odata_requests.with_label_values(&["get_by_key"]).inc();
    info!(table = %state.resolver.table().table_name, key, "OData request: get row by id");
    let entity = state.resolver.get_by_key(key).await?;
    let body = EntityBody {
        context: format!("{ODATA_ROOT}/{METADATA_SEGMENT}#{ENTITY_SET}/$entity"),
        entity: &entity,
    };
    Ok(odata_response(Json(body)))
}

fn odata_response(inner: impl IntoResponse) -> Response {
    let mut response = inner.into_response();
    response
        .headers_mut()
        .insert(HeaderName::from_static(ODATA_VERSION_HEADER), HeaderValue::from_static(ODATA_VERSION));
    response
}
