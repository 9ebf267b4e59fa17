//! Integration tests for the teams endpoints.

mod common;

use axum::http::StatusCode;
use racers_core::id::Id;
use serde_json::json;

#[tokio::test]
async fn test_create_team_makes_current_user_admin() {
    // Arrange
    let app = common::build_test_app();
    let admin = common::create_user(app.clone(), "Admin").await;

    // Act
    let (status, json) =
        common::post_json_as(app, &admin, "/api/v1/teams", &json!({ "name": "Velo" })).await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["admin_id"], admin.as_str());
    assert_eq!(json["members"], json!([admin]));
}

#[tokio::test]
async fn test_create_team_without_admin_returns_401() {
    let app = common::build_test_app();

    let (status, _) = common::post_json(app, "/api/v1/teams", &json!({ "name": "Velo" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_can_only_belong_to_one_team() {
    // Arrange
    let app = common::build_test_app();
    let first_admin = common::create_user(app.clone(), "First").await;
    let second_admin = common::create_user(app.clone(), "Second").await;
    let rider = common::create_user(app.clone(), "Rider").await;
    let (_, first) = common::post_json_as(
        app.clone(),
        &first_admin,
        "/api/v1/teams",
        &json!({ "name": "Velo" }),
    )
    .await;
    let (_, second) = common::post_json_as(
        app.clone(),
        &second_admin,
        "/api/v1/teams",
        &json!({ "name": "Pedal" }),
    )
    .await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    // Act
    let (joined_status, joined) = common::post_json_as(
        app.clone(),
        &rider,
        &format!("/api/v1/teams/{first_id}/join"),
        &json!({}),
    )
    .await;
    let (status, json) = common::post_json_as(
        app.clone(),
        &rider,
        &format!("/api/v1/teams/{second_id}/join"),
        &json!({}),
    )
    .await;

    // Assert
    assert_eq!(joined_status, StatusCode::OK);
    assert_eq!(joined["members"].as_array().unwrap().len(), 2);
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");

    let (_, second) = common::get_json(app, &format!("/api/v1/teams/{second_id}")).await;
    assert_eq!(second["members"], json!([second_admin]));
}

#[tokio::test]
async fn test_get_unknown_team_returns_404() {
    let app = common::build_test_app();

    let (status, _) = common::get_json(app, &format!("/api/v1/teams/{}", Id::generate())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_team_with_malformed_id_returns_400() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(app, "/api/v1/teams/not-an-id").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"].as_array().unwrap().len(), 1);
}
