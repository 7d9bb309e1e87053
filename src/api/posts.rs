//! Post API endpoints
//!
//! - GET    /api/v1/posts             - List posts (paginated, without tags)
//! - GET    /api/v1/posts/{id}        - Get post with tags
//! - GET    /api/v1/posts/slug/{slug} - Get post with tags by slug
//! - POST   /api/v1/posts/{id}/view   - Record a view
//! - POST   /api/v1/posts             - Create post (admin)
//! - PATCH  /api/v1/posts/{id}        - Update post (admin)
//! - DELETE /api/v1/posts/{id}        - Soft delete post (admin)

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
use crate::models::{CreatePostInput, Post, PostFilter, PostStatus, PostWithTags, UpdatePostInput};
use crate::services::{DomainError, EntityKind, Page};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<PostStatus>,
    pub is_active: Option<bool>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Build the post router
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", patch(update_post).delete(delete_post))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
        .route("/posts/slug/{slug}", get(get_post_by_slug))
        .route("/posts/{id}/view", post(record_view))
        .merge(admin)
}

async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPostsQuery>,
) -> Result<ApiResponse<Page<Post>>, ApiError> {
    let sort = parse_sort(query.sort.as_deref())?;
    let page = page_request(query.page, query.limit, state.default_limit);
    let filter = PostFilter {
        title: query.title,
        slug: query.slug,
        status: query.status,
        is_active: query.is_active,
        author_id: query.author_id,
        category_id: query.category_id,
    };

    let result = state.post_service.list(&filter, &sort, page).await?;
    Ok(ApiResponse::paginated(result, "Posts retrieved"))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<PostWithTags>, ApiError> {
    let post = state
        .post_service
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Post, id))?;

    Ok(ApiResponse::ok(post, "Post retrieved"))
}

async fn get_post_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<PostWithTags>, ApiError> {
    let post = state
        .post_service
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Post, &slug))?;

    Ok(ApiResponse::ok(post, "Post retrieved"))
}

/// POST /api/v1/posts/{id}/view
async fn record_view(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    let post = state
        .post_service
        .increment_view_count(id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Post, id))?;

    Ok(ApiResponse::ok(
        json!({ "id": post.id, "viewCount": post.view_count }),
        "View recorded",
    ))
}

async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> Result<ApiResponse<PostWithTags>, ApiError> {
    let post = state.post_service.create(input).await?;
    Ok(ApiResponse::created(post, "Post created"))
}

async fn update_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdatePostInput>,
) -> Result<ApiResponse<PostWithTags>, ApiError> {
    let post = state
        .post_service
        .update(id, input)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Post, id))?;

    Ok(ApiResponse::ok(post, "Post updated"))
}

async fn delete_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    if !state.post_service.remove(id).await? {
        return Err(DomainError::not_found(EntityKind::Post, id).into());
    }
    Ok(ApiResponse::ok(json!({ "id": id }), "Post deleted"))
}
