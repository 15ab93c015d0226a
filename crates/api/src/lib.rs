//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Bearer token authentication middleware
//! - Request extractors and the JSON error contract
//! - The HTTP client for the auth service's credential checks

pub mod credentials;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use pocketbank_core::CoreServices;
use pocketbank_shared::JwtService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

pub use credentials::HttpCredentialVerifier;
pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The money-movement services.
    pub services: CoreServices,
    /// Bearer token validation.
    pub jwt: Arc<JwtService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
