//! Administrative media API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use ddlshelf_core::media::{DocumentPatch, MediaListQuery, MediaPage, MediaStats};
use ddlshelf_core::{MediaDocument, MediaError, MediaIdentity, MediaType};

use super::error::ApiError;
use super::middleware::AuthPrincipal;
use crate::state::AppState;

/// Default page size for admin listings
const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct ListMediaParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

fn identity(media_type: &str, external_id: u32) -> Result<MediaIdentity, ApiError> {
    let media_type: MediaType = media_type.parse()?;
    Ok(MediaIdentity {
        media_type,
        external_id,
    })
}

fn not_found(identity: &MediaIdentity) -> ApiError {
    ApiError(MediaError::NotFound(format!("{} not found", identity)))
}

/// GET /api/v1/media/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<MediaStats>, ApiError> {
    Ok(Json(state.store().stats()?))
}

/// GET /api/v1/media/{media_type}
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<ListMediaParams>,
) -> Result<Json<MediaPage>, ApiError> {
    let media_type: MediaType = media_type.parse()?;

    let mut query = MediaListQuery::new(media_type).with_page(
        params.page.unwrap_or(1),
        params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        query = query.with_search(search);
    }

    Ok(Json(state.store().list(&query)?))
}

/// GET /api/v1/media/{media_type}/{external_id}
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path((media_type, external_id)): Path<(String, u32)>,
) -> Result<Json<MediaDocument>, ApiError> {
    let identity = identity(&media_type, external_id)?;
    state
        .store()
        .find(&identity)?
        .map(Json)
        .ok_or_else(|| not_found(&identity))
}

/// PATCH /api/v1/media/{media_type}/{external_id}
///
/// Accepts descriptive fields only; returns the updated document.
pub async fn update_media(
    State(state): State<Arc<AppState>>,
    Path((media_type, external_id)): Path<(String, u32)>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(body): Json<Value>,
) -> Result<Json<MediaDocument>, ApiError> {
    let identity = identity(&media_type, external_id)?;
    let patch = DocumentPatch::from_json(body)?;

    if !state.store().update_fields(&identity, &patch)? {
        return Err(not_found(&identity));
    }
    info!("{} updated fields of {}", principal.subject, identity);

    state
        .store()
        .find(&identity)?
        .map(Json)
        .ok_or_else(|| not_found(&identity))
}

/// DELETE /api/v1/media/{media_type}/{external_id}
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path((media_type, external_id)): Path<(String, u32)>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<StatusCode, ApiError> {
    let identity = identity(&media_type, external_id)?;

    if !state.store().delete(&identity)? {
        return Err(not_found(&identity));
    }
    info!("{} deleted {}", principal.subject, identity);
    Ok(StatusCode::NO_CONTENT)
}
