//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limiter = state.rate_limiter.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let storage = Router::new()
        .route("/storage", get(handlers::list_sites))
        .route("/storage/{site}", get(handlers::site_contents))
        .route(
            "/storage/{site}/{bucket}",
            get(handlers::bucket_contents)
                .post(handlers::create_bucket)
                .delete(handlers::delete_bucket),
        )
        .route(
            "/storage/{site}/{bucket}/{*object}",
            get(handlers::download_object)
                .post(handlers::upload_multipart)
                .put(handlers::upload_raw)
                .delete(handlers::delete_object),
        );

    let prefix = state.config.route_prefix().to_string();
    let routes = if prefix.is_empty() {
        storage
    } else {
        Router::new().nest(&prefix, storage)
    };

    routes
        .route("/health", get(handlers::health_check))
        // Apply middleware
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}
