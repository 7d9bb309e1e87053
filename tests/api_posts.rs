//! Post endpoints: tag linking, usage counting and pagination

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use common::{delete, get, patch_json, post_json, send, test_app};

async fn tag_usage(app: &axum::Router, slug: &str) -> i64 {
    let (status, body) = get(app, &format!("/api/v1/tags/slug/{}", slug)).await;
    assert_eq!(status, StatusCode::OK, "tag {} should exist", slug);
    body["data"]["usageCount"].as_i64().unwrap()
}

fn tag_slugs(post: &Value) -> Vec<String> {
    post["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_post_links_existing_and_new_tags() {
    let app = test_app().await;

    let (_, tag) = post_json(&app, "/api/v1/tags", json!({ "name": "Rust" })).await;
    let rust_id = tag["data"]["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &app,
        "/api/v1/posts",
        json!({
            "title": "Hello World",
            "authorId": 1,
            "tagIds": [rust_id, 9999],
            "tagNames": ["Axum", " sqlx ", "Axum"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "hello-world");
    assert_eq!(tag_slugs(&body["data"]), ["axum", "rust", "sqlx"]);

    for slug in ["rust", "axum", "sqlx"] {
        assert_eq!(tag_usage(&app, slug).await, 1, "{}", slug);
    }
}

#[tokio::test]
async fn test_post_with_unknown_category_is_rejected() {
    let app = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Orphan", "authorId": 1, "categoryId": 42 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["categoryId"], "categoryNotFound");
}

#[tokio::test]
async fn test_rejected_tag_name_leaves_no_orphan_tags() {
    let app = test_app().await;
    post_json(&app, "/api/v1/tags", json!({ "name": "JS" })).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Frontend", "authorId": 1, "tagNames": ["orphan", "js"] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["errors"]["tagNames"], "slugAlreadyExists");
    assert!(body["errors"].get("slug").is_none());

    let (status, _) = get(&app, "/api/v1/tags/slug/orphan").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/v1/posts/slug/frontend").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejected_tags_on_update_keep_post_unchanged() {
    let app = test_app().await;
    post_json(&app, "/api/v1/tags", json!({ "name": "JS" })).await;
    let (_, created) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Frontend", "authorId": 1, "tagNames": ["css"] }),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = patch_json(
        &app,
        &format!("/api/v1/posts/{}", id),
        json!({ "title": "Backend", "tagNames": ["fresh", "js"] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["tagNames"], "slugAlreadyExists");

    let (_, current) = get(&app, &format!("/api/v1/posts/{}", id)).await;
    assert_eq!(current["data"]["title"], "Frontend");
    assert_eq!(tag_slugs(&current["data"]), ["css"]);
    let (status, _) = get(&app, "/api/v1/tags/slug/fresh").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_post_releases_tag_usage() {
    let app = test_app().await;

    let (_, created) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Short Lived", "authorId": 1, "tagNames": ["temp"] }),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(tag_usage(&app, "temp").await, 1);

    let (status, _) = delete(&app, &format!("/api/v1/posts/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag_usage(&app, "temp").await, 0);

    let (status, _) = get(&app, &format!("/api/v1/posts/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replacing_tags_moves_usage() {
    let app = test_app().await;

    let (_, created) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Evolving", "authorId": 1, "tagNames": ["a", "b"] }),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = patch_json(
        &app,
        &format!("/api/v1/posts/{}", id),
        json!({ "tagNames": ["b", "c"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag_slugs(&body["data"]), ["b", "c"]);

    assert_eq!(tag_usage(&app, "a").await, 0);
    assert_eq!(tag_usage(&app, "b").await, 1);
    assert_eq!(tag_usage(&app, "c").await, 1);
}

#[tokio::test]
async fn test_deactivating_post_releases_usage() {
    let app = test_app().await;

    let (_, created) = post_json(
        &app,
        "/api/v1/posts",
        json!({ "title": "Toggle", "authorId": 1, "tagNames": ["flip"] }),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, _) =
        patch_json(&app, &format!("/api/v1/posts/{}", id), json!({ "isActive": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag_usage(&app, "flip").await, 0);

    let (status, _) =
        patch_json(&app, &format!("/api/v1/posts/{}", id), json!({ "isActive": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag_usage(&app, "flip").await, 1);
}

#[tokio::test]
async fn test_publishing_sets_published_at_once() {
    let app = test_app().await;

    let (_, created) =
        post_json(&app, "/api/v1/posts", json!({ "title": "Draft", "authorId": 1 })).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["status"], "draft");
    assert!(created["data"]["publishedAt"].is_null());

    let uri = format!("/api/v1/posts/{}", id);
    let (_, published) = patch_json(&app, &uri, json!({ "status": "published" })).await;
    let first = published["data"]["publishedAt"].clone();
    assert!(first.is_string());

    let (_, archived) = patch_json(&app, &uri, json!({ "status": "archived" })).await;
    assert_eq!(archived["data"]["publishedAt"], first);
}

#[tokio::test]
async fn test_record_view_increments_counter() {
    let app = test_app().await;

    let (_, created) =
        post_json(&app, "/api/v1/posts", json!({ "title": "Popular", "authorId": 1 })).await;
    let id = created["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/posts/{}/view", id);

    send(&app, Method::POST, &uri, None, None).await;
    let (status, body) = send(&app, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["viewCount"], 2);

    let (status, _) = send(&app, Method::POST, "/api/v1/posts/999/view", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pages_with_lookahead() {
    let app = test_app().await;

    for i in 1..=11 {
        let (status, _) = post_json(
            &app,
            "/api/v1/posts",
            json!({ "title": format!("Post {}", i), "authorId": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = get(&app, "/api/v1/posts?page=1&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["data"].as_array().unwrap().len(), 10);
    assert_eq!(first["data"]["hasNextPage"], true);
    assert!(first["data"]["data"][0].get("tags").is_none());

    let (_, second) = get(&app, "/api/v1/posts?page=2&limit=10").await;
    assert_eq!(second["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(second["data"]["hasNextPage"], false);

    let ids: BTreeSet<i64> = first["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["data"]["data"].as_array().unwrap())
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 11);

    let (_, capped) = get(&app, "/api/v1/posts?limit=500").await;
    assert_eq!(capped["data"]["data"].as_array().unwrap().len(), 11);
    assert_eq!(capped["data"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_sorts_by_title() {
    let app = test_app().await;

    for title in ["Banana", "Apple", "Cherry"] {
        post_json(&app, "/api/v1/posts", json!({ "title": title, "authorId": 1 })).await;
    }

    let (status, body) = get(&app, "/api/v1/posts?sort=title:asc").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Apple", "Banana", "Cherry"]);
}
