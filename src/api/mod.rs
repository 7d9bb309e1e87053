//! API layer - HTTP handlers and routing
//!
//! Every response, success or failure, is wrapped in the [`Envelope`]. The
//! handlers are thin: they parse the request, call one service and hand the
//! result to [`ApiResponse`] or [`ApiError`].
//!
//! - Category, tag and post endpoints under `/api/v1`
//! - `GET /api/v1/health`
//! - Envelope-shaped 404 for unknown routes, 405 for unserved methods and
//!   500 for handler panics

pub mod categories;
pub mod common;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod posts;
pub mod tags;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

pub use envelope::{ApiResponse, Envelope};
pub use error::{ApiError, ErrorCode};
pub use middleware::AppState;

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // applies to the routes registered above it
    Router::new()
        .route("/health", get(health))
        .merge(categories::router(state.clone()))
        .merge(tags::router(state.clone()))
        .merge(posts::router(state))
        .method_not_allowed_fallback(error::method_not_allowed)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!(cors_origin, "Invalid CORS origin, cross-origin requests disabled"),
    }

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .fallback(error::route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .with_state(state)
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> Result<ApiResponse<Value>, ApiError> {
    state
        .db
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database ping failed: {:#}", e)))?;

    Ok(ApiResponse::ok(
        json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        "Service healthy",
    ))
}
