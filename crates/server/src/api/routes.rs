use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{addon, handlers, links, media};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Catalog protocol, public and fetched cross-origin by players
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let addon_routes = Router::new()
        .route("/manifest.json", get(addon::manifest))
        .route("/catalog/{content_type}/{catalog_id}", get(addon::catalog))
        .route(
            "/catalog/{content_type}/{catalog_id}/{extra}",
            get(addon::catalog_with_extra),
        )
        .route("/meta/{content_type}/{id}", get(addon::meta))
        .route("/stream/{content_type}/{id}", get(addon::stream))
        .layer(cors);

    // Administrative API, behind the authenticator
    let admin_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/media/stats", get(media::stats))
        .route("/media/{media_type}", get(media::list_media))
        .route(
            "/media/{media_type}/{external_id}",
            get(media::get_media)
                .patch(media::update_media)
                .delete(media::delete_media),
        )
        .route("/links", post(links::add_link))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(admin_routes);

    Router::new()
        .nest("/stremio", addon_routes)
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
