//! Shared helpers for HTTP-level tests
//!
//! Each test gets its own in-memory database with migrations applied and a
//! router wired exactly as `main.rs` wires it.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use pressroom::api::{build_router, AppState};
use pressroom::config::{ApiToken, AuthConfig, Role};
use pressroom::db::{
    create_test_pool,
    migrations::run_migrations,
    repositories::{SqlxCategoryRepository, SqlxPostRepository, SqlxTagRepository},
};
use pressroom::services::{CategoryService, PostService, TagLifecycleManager, TagService};

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const USER_TOKEN: &str = "user-secret";

pub async fn test_app() -> Router {
    let db = create_test_pool().await.expect("Failed to create test pool");
    run_migrations(&db).await.expect("Failed to run migrations");

    let category_repo = SqlxCategoryRepository::boxed(db.clone());
    let tag_repo = SqlxTagRepository::boxed(db.clone());
    let post_repo = SqlxPostRepository::boxed(db.clone());
    let lifecycle = Arc::new(TagLifecycleManager::new(tag_repo.clone()));

    let auth = AuthConfig {
        tokens: vec![
            ApiToken {
                token: ADMIN_TOKEN.to_string(),
                role: Role::Admin,
            },
            ApiToken {
                token: USER_TOKEN.to_string(),
                role: Role::User,
            },
        ],
    };

    let state = AppState {
        db,
        auth: Arc::new(auth),
        default_limit: 10,
        category_service: Arc::new(CategoryService::new(category_repo.clone())),
        tag_service: Arc::new(TagService::new(tag_repo)),
        post_service: Arc::new(PostService::new(post_repo, category_repo, lifecycle)),
    };

    build_router(state, "http://localhost:3000")
}

/// Send one request and return the status with the parsed JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(ADMIN_TOKEN), Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(ADMIN_TOKEN), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, Some(ADMIN_TOKEN), None).await
}
