//! API middleware
//!
//! Contains the shared application state and the role gate for write routes.
//! Callers identify themselves with `Authorization: Bearer <token>`; tokens
//! and their roles come from the `auth` configuration section.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::config::{AuthConfig, Role};
use crate::db::Database;
use crate::services::{CategoryService, PostService, TagService};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthConfig>,
    /// List page size when the request gives none
    pub default_limit: i64,
    pub category_service: Arc<CategoryService>,
    pub tag_service: Arc<TagService>,
    pub post_service: Arc<PostService>,
}

/// Extract the bearer token from the `Authorization` header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Admin authorization middleware
///
/// Missing or unknown token: `UNAUTHORIZED`. Known token without the admin
/// role: `FORBIDDEN`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let role = state.auth.role_for(token).ok_or_else(|| {
        tracing::warn!(path = %request.uri().path(), "Rejected unknown API token");
        ApiError::unauthorized("Invalid authentication token")
    })?;

    if role != Role::Admin {
        tracing::warn!(path = %request.uri().path(), "Rejected non-admin caller");
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}
