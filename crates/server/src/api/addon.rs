//! Catalog protocol handlers, mounted under `/stremio`.
//!
//! Every resource is addressed as `<name>.json`; the suffix is stripped
//! from the last path segment before lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use ddlshelf_core::{
    addon::{CatalogResponse, Manifest, MetaResponse, StreamsResponse},
    CatalogExtra,
};

use super::error::ApiError;
use crate::state::AppState;

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// GET /stremio/manifest.json
pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(state.addon().manifest())
}

/// GET /stremio/catalog/{type}/{catalog_id}.json
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path((content_type, catalog_id)): Path<(String, String)>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let metas = state.addon().catalog(
        &content_type,
        strip_json(&catalog_id),
        &CatalogExtra::default(),
    )?;
    Ok(Json(CatalogResponse { metas }))
}

/// GET /stremio/catalog/{type}/{catalog_id}/{extra}.json
pub async fn catalog_with_extra(
    State(state): State<Arc<AppState>>,
    Path((content_type, catalog_id, extra)): Path<(String, String, String)>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let extra = CatalogExtra::parse(strip_json(&extra));
    let metas = state.addon().catalog(&content_type, &catalog_id, &extra)?;
    Ok(Json(CatalogResponse { metas }))
}

/// GET /stremio/meta/{type}/{id}.json
pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Json<MetaResponse>, ApiError> {
    let meta = state.addon().meta(&content_type, strip_json(&id))?;
    Ok(Json(MetaResponse { meta }))
}

/// GET /stremio/stream/{type}/{id}.json
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Json<StreamsResponse>, ApiError> {
    let streams = state.addon().streams(&content_type, strip_json(&id))?;
    Ok(Json(StreamsResponse { streams }))
}
