//! Link submission: resolve a download URL and register it on the shelf.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ddlshelf_core::{MediaError, MediaIdentity, MergeChange, Registration};

use super::error::{error_kind, ApiError};
use super::middleware::AuthPrincipal;
use crate::metrics::{REGISTRATIONS_TOTAL, REGISTRATION_CONFLICT_RETRIES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddLinkBody {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AddLinkResponse {
    pub message: String,
    pub title: String,
    pub change: MergeChange,
    #[serde(flatten)]
    pub identity: MediaIdentity,
}

/// POST /api/v1/links
pub async fn add_link(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(body): Json<AddLinkBody>,
) -> Result<Json<AddLinkResponse>, ApiError> {
    info!("Link submitted by {}: {}", principal.subject, body.url);

    let registration = match register_link(&state, &body.url).await {
        Ok(registration) => registration,
        Err(e) => {
            warn!("Link '{}' was not registered: {}", body.url, e);
            REGISTRATIONS_TOTAL.with_label_values(&[error_kind(&e)]).inc();
            return Err(e.into());
        }
    };

    REGISTRATIONS_TOTAL
        .with_label_values(&[registration.change.as_str()])
        .inc();

    Ok(Json(AddLinkResponse {
        message: format!("Successfully processed and added '{}'", registration.title),
        title: registration.title,
        change: registration.change,
        identity: registration.identity,
    }))
}

async fn register_link(state: &AppState, url: &str) -> Result<Registration, MediaError> {
    if url.trim().is_empty() {
        return Err(MediaError::InvalidInput("url must not be empty".to_string()));
    }

    let prepared = state.intake().prepare(url).await?;

    // A conflict means another registration for the same title committed
    // between our read and our write; recompute the merge from fresh state.
    let max_retries = state.max_conflict_retries();
    let mut attempt = 0;
    loop {
        match state.registrar().register(
            &prepared.resolved,
            &prepared.size,
            &prepared.display_name,
        ) {
            Err(MediaError::ConcurrentUpdateConflict { identity }) if attempt < max_retries => {
                attempt += 1;
                REGISTRATION_CONFLICT_RETRIES.inc();
                info!(
                    "Conflict registering {} (attempt {}/{}), retrying",
                    identity, attempt, max_retries
                );
            }
            result => return result,
        }
    }
}
