//! Tag API endpoints
//!
//! - GET    /api/v1/tags             - List tags (paginated)
//! - GET    /api/v1/tags/{id}        - Get tag by ID
//! - GET    /api/v1/tags/slug/{slug} - Get tag by slug
//! - POST   /api/v1/tags             - Create tag (admin)
//! - PATCH  /api/v1/tags/{id}        - Update tag (admin)
//! - DELETE /api/v1/tags/{id}        - Soft delete tag (admin)

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{page_request, parse_sort};
use super::envelope::ApiResponse;
use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::middleware::{self, AppState};
use crate::models::{CreateTagInput, Tag, TagFilter, UpdateTagInput};
use crate::services::{DomainError, EntityKind, Page};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

/// Build the tag router
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/tags", post(create_tag))
        .route("/tags/{id}", patch(update_tag).delete(delete_tag))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/{id}", get(get_tag))
        .route("/tags/slug/{slug}", get(get_tag_by_slug))
        .merge(admin)
}

async fn list_tags(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTagsQuery>,
) -> Result<ApiResponse<Page<Tag>>, ApiError> {
    let sort = parse_sort(query.sort.as_deref())?;
    let page = page_request(query.page, query.limit, state.default_limit);
    let filter = TagFilter {
        name: query.name,
        slug: query.slug,
        is_active: query.is_active,
    };

    let result = state.tag_service.list(&filter, &sort, page).await?;
    Ok(ApiResponse::paginated(result, "Tags retrieved"))
}

async fn get_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Tag>, ApiError> {
    let tag = state
        .tag_service
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Tag, id))?;

    Ok(ApiResponse::ok(tag, "Tag retrieved"))
}

async fn get_tag_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<Tag>, ApiError> {
    let tag = state
        .tag_service
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Tag, &slug))?;

    Ok(ApiResponse::ok(tag, "Tag retrieved"))
}

async fn create_tag(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateTagInput>,
) -> Result<ApiResponse<Tag>, ApiError> {
    let tag = state.tag_service.create(input).await?;
    Ok(ApiResponse::created(tag, "Tag created"))
}

async fn update_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateTagInput>,
) -> Result<ApiResponse<Tag>, ApiError> {
    let tag = state
        .tag_service
        .update(id, input)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Tag, id))?;

    Ok(ApiResponse::ok(tag, "Tag updated"))
}

async fn delete_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    if !state.tag_service.remove(id).await? {
        return Err(DomainError::not_found(EntityKind::Tag, id).into());
    }
    Ok(ApiResponse::ok(json!({ "id": id }), "Tag deleted"))
}
