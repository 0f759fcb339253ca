//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use ddlshelf_core::{AuthError, AuthRequest, Principal};

use super::error::ErrorResponse;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Records request duration, count and in-flight gauge per normalized path.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

fn unauthorized(reason: &'static str, message: String) -> Response {
    AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: message })).into_response()
}

/// Validates requests with the configured authenticator.
///
/// On success the [`Principal`] is stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let authenticator = state.authenticator();

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    // Only present when served with connect info; tests go through oneshot.
    let source_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match authenticator.authenticate(&auth_request).await {
        Ok(principal) => {
            debug!(
                "Authenticated {} via {} from {}",
                principal.subject, principal.method, source_ip
            );
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e @ AuthError::NotAuthenticated) => unauthorized("not_authenticated", e.to_string()),
        Err(e @ AuthError::InvalidCredentials(_)) => {
            unauthorized("invalid_credentials", e.to_string())
        }
        Err(e) => {
            error!("Authenticator failed: {}", e);
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "authentication unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Extractor for the principal set by [`auth_middleware`].
///
/// Falls back to the anonymous principal on routes without the middleware.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or_else(Principal::anonymous);
        std::future::ready(Ok(AuthPrincipal(principal)))
    }
}
