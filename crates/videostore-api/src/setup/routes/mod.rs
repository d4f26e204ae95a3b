//! Route configuration and setup.
//!
//! Video routes are registered both with and without the trailing slash so that
//! `/videos` and `/videos/` behave the same.

mod health;

use crate::api_doc::ApiDoc;
use crate::handlers::{video_download, video_get, video_upload};
use crate::middleware::{request_id_middleware, RequestId};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use videostore_core::Config;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or_default();
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = video_routes()
        .merge(public_routes(config))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(DefaultBodyLimit::disable());

    // Uploads are unbounded unless MAX_UPLOAD_BYTES is set.
    let app = match config.max_upload_bytes {
        Some(limit) => {
            tracing::info!(max_upload_bytes = limit, "Request body limit enabled");
            app.layer(RequestBodyLimitLayer::new(limit))
        }
        None => app,
    };

    let app = app
        .layer(cors)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn video_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/videos/",
            get(video_get::list_videos).post(video_upload::upload_video),
        )
        .route(
            "/videos",
            get(video_get::list_videos).post(video_upload::upload_video),
        )
        .route("/videos/{id}/file", get(video_download::download_video))
        .route("/videos/{id}/metadata", get(video_get::get_video_metadata))
}

fn public_routes(config: &Config) -> Router<Arc<AppState>> {
    let index = ServeFile::new(config.static_dir.join("index.html"));
    let assets = ServeDir::new(&config.static_dir);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .route_service("/", index)
        .nest_service("/static", assets)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
