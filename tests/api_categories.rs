//! Category and tag endpoints

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{delete, get, patch_json, post_json, test_app};

#[tokio::test]
async fn test_create_category_derives_slug() {
    let app = test_app().await;

    let (status, body) = post_json(&app, "/api/v1/categories", json!({ "name": "Technology" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "technology");
    assert_eq!(body["data"]["isActive"], true);
}

#[tokio::test]
async fn test_conflicting_derived_slug_is_rejected() {
    let app = test_app().await;

    let (status, _) = post_json(&app, "/api/v1/categories", json!({ "name": "Technology" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        post_json(&app, "/api/v1/categories", json!({ "name": "Technology!!" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["errors"]["slug"], "slugAlreadyExists");
}

#[tokio::test]
async fn test_deleted_category_frees_its_slug() {
    let app = test_app().await;

    let (_, created) = post_json(&app, "/api/v1/categories", json!({ "name": "News" })).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = delete(&app, &format!("/api/v1/categories/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, _) = get(&app, &format!("/api/v1/categories/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/v1/categories/slug/news").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = delete(&app, &format!("/api/v1/categories/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(&app, "/api/v1/categories", json!({ "name": "News" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "news");
}

#[tokio::test]
async fn test_category_rename_regenerates_slug() {
    let app = test_app().await;

    let (_, created) = post_json(&app, "/api/v1/categories", json!({ "name": "Old Name" })).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = patch_json(
        &app,
        &format!("/api/v1/categories/{}", id),
        json!({ "name": "New Name", "description": "fresh" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "new-name");
    assert_eq!(body["data"]["description"], "fresh");

    let (status, _) = get(&app, "/api/v1/categories/slug/new-name").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_category_list_filters_and_sorts() {
    let app = test_app().await;

    for (name, order) in [("Beta", 2), ("Alpha", 1), ("Gamma", 3)] {
        let (status, _) = post_json(
            &app,
            "/api/v1/categories",
            json!({ "name": name, "sortOrder": order }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(&app, "/api/v1/categories?sort=name:desc").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Gamma", "Beta", "Alpha"]);

    let (_, body) = get(&app, "/api/v1/categories?name=alp").await;
    let items = body["data"]["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Alpha");
}

#[tokio::test]
async fn test_tag_with_invalid_color_is_rejected() {
    let app = test_app().await;

    let (status, body) =
        post_json(&app, "/api/v1/tags", json!({ "name": "rust", "color": "orange" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["color"], "colorInvalid");

    let (status, body) =
        post_json(&app, "/api/v1/tags", json!({ "name": "rust", "color": "#ff8800" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["usageCount"], 0);
    assert_eq!(body["data"]["slug"], "rust");
}

#[tokio::test]
async fn test_tag_slug_conflict_is_rejected() {
    let app = test_app().await;

    let (status, _) = post_json(&app, "/api/v1/tags", json!({ "name": "Web Dev" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        post_json(&app, "/api/v1/tags", json!({ "name": "Other", "slug": "web-dev" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["slug"], "slugAlreadyExists");
}
