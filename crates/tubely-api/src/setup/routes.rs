//! Router construction

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::handlers::{health, thumbnail_upload, video_get, video_upload};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tubely_core::Config;
use utoipa::OpenApi;

// Room for multipart boundaries and headers around the file itself
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build the full application router
pub fn setup_routes(state: Arc<AppState>) -> Result<Router> {
    let config = &state.config;
    crate::error::configure_error_details(config);
    let cors = setup_cors(config)?;

    let body_limit = config
        .max_video_size_bytes
        .max(config.max_thumbnail_size_bytes)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let protected = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.jwt.clone(),
        auth_middleware,
    ));

    let app = public_routes()
        .merge(protected)
        .nest_service("/assets", ServeDir::new(&config.assets_root))
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(state);

    Ok(app)
}

/// Routes that require a bearer token
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/video_upload/{video_id}",
            post(video_upload::upload_video),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(thumbnail_upload::upload_thumbnail),
        )
        .route("/api/videos", get(video_get::list_videos))
        .route("/api/videos/{video_id}", get(video_get::get_video))
}

/// Routes open to anyone
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
