//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api`:
//! - User/Auth endpoints (`auth`)
//! - Document endpoints (`docs`), all behind `require_auth`
//!
//! Responses use the `{error?, response?, data?}` envelope.

pub mod auth;
pub mod docs;
pub mod middleware;
pub mod responses;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;

pub use middleware::{ApiError, AppState, AuthenticatedUser};
pub use responses::ApiResponse;

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(docs::router(state))
}

/// CORS for the configured origin; `*` allows any origin
fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin '{}', allowing any origin", origin);
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.upload.max_body_size))
        .layer(cors_layer(&config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================
