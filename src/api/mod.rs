//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`:
//! - Auth and member endpoints
//! - Portfolio, resume and project management endpoints
//! - Blog, comment, newsletter and tag endpoints
//! - Contact form, FAQ and admin inbox endpoints
//! - Uploads and health
//!
//! Uploaded files are served from `/uploads/`.

pub mod auth;
pub mod blog;
pub mod common;
pub mod contact;
pub mod health;
pub mod middleware;
pub mod portfolio;
pub mod resume;
pub mod upload;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let upload_limit = state.upload_config.max_file_size as usize + MULTIPART_OVERHEAD;

    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .merge(users::admin_router())
        .merge(portfolio::admin_router())
        .merge(blog::admin_router())
        .merge(contact::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .merge(users::protected_router())
        .merge(portfolio::protected_router())
        .merge(resume::router())
        .merge(blog::protected_router())
        .merge(upload::router().layer(DefaultBodyLimit::max(upload_limit)))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes; a valid session still identifies the viewer
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::public_router())
        .merge(users::public_router())
        .merge(portfolio::public_router())
        .merge(blog::public_router())
        .merge(contact::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let origin = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(%cors_origin, "Invalid CORS origin ({}), allowing none", e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest_service("/uploads", ServeDir::new(&state.upload_config.path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
