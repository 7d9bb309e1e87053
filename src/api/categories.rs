//! Category API endpoints
//!
//! Handles HTTP requests for category management:
//! - GET    /api/v1/categories            - List categories (paginated)
//! - GET    /api/v1/categories/{id}       - Get category by ID
//! - GET    /api/v1/categories/slug/{slug} - Get category by slug
//! - POST   /api/v1/categories            - Create category (admin)
//! - PATCH  /api/v1/categories/{id}       - Update category (admin)
//! - DELETE /api/v1/categories/{id}       - Soft delete category (admin)

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{page_request, parse_sort};
use super::envelope::ApiResponse;
use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::middleware::{self, AppState};
use crate::models::{Category, CategoryFilter, CreateCategoryInput, UpdateCategoryInput};
use crate::services::{DomainError, EntityKind, Page};

/// Query parameters for listing categories
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub parent_id: Option<i64>,
}

/// Build the category router
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            axum::routing::patch(update_category).delete(delete_category),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
        .route("/categories/slug/{slug}", get(get_category_by_slug))
        .merge(admin)
}

/// GET /api/v1/categories
async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCategoriesQuery>,
) -> Result<ApiResponse<Page<Category>>, ApiError> {
    let sort = parse_sort(query.sort.as_deref())?;
    let page = page_request(query.page, query.limit, state.default_limit);
    let filter = CategoryFilter {
        name: query.name,
        slug: query.slug,
        is_active: query.is_active,
        parent_id: query.parent_id,
    };

    let result = state.category_service.list(&filter, &sort, page).await?;
    Ok(ApiResponse::paginated(result, "Categories retrieved"))
}

/// GET /api/v1/categories/{id}
async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Category>, ApiError> {
    let category = state
        .category_service
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Category, id))?;

    Ok(ApiResponse::ok(category, "Category retrieved"))
}

/// GET /api/v1/categories/slug/{slug}
async fn get_category_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<Category>, ApiError> {
    let category = state
        .category_service
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Category, &slug))?;

    Ok(ApiResponse::ok(category, "Category retrieved"))
}

/// POST /api/v1/categories
async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCategoryInput>,
) -> Result<ApiResponse<Category>, ApiError> {
    let category = state.category_service.create(input).await?;
    Ok(ApiResponse::created(category, "Category created"))
}

/// PATCH /api/v1/categories/{id}
async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateCategoryInput>,
) -> Result<ApiResponse<Category>, ApiError> {
    let category = state
        .category_service
        .update(id, input)
        .await?
        .ok_or_else(|| DomainError::not_found(EntityKind::Category, id))?;

    Ok(ApiResponse::ok(category, "Category updated"))
}

/// DELETE /api/v1/categories/{id}
async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    if !state.category_service.remove(id).await? {
        return Err(DomainError::not_found(EntityKind::Category, id).into());
    }
    Ok(ApiResponse::ok(json!({ "id": id }), "Category deleted"))
}
