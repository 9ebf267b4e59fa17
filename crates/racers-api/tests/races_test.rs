//! Integration tests for the races endpoints.

mod common;

use axum::http::StatusCode;
use racers_core::event_bus::InMemoryEventBus;
use racers_core::id::Id;
use serde_json::json;

const RACE_DATE: &str = "2026-02-01T09:00:00Z";

#[tokio::test]
async fn test_race_lifecycle() {
    // Arrange
    let bus = InMemoryEventBus::new();
    let app = common::build_test_app_with_bus(bus.clone());
    let owner = common::create_user(app.clone(), "Owner").await;
    let rider = common::create_user(app.clone(), "Rider").await;
    let race = json!({ "name": "Spring Classic", "date": RACE_DATE });

    // Act: create
    let (status, created) =
        common::post_json_as(app.clone(), &owner, "/api/v1/races", &race).await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Spring Classic");
    assert_eq!(created["owner_id"], owner.as_str());
    assert_eq!(created["competitors"], json!([]));
    let race_id = created["id"].as_str().unwrap().to_owned();

    // Act: duplicate name and date
    let (status, json) =
        common::post_json_as(app.clone(), &owner, "/api/v1/races", &race).await;

    // Assert
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");

    // Act: join
    let join_uri = format!("/api/v1/races/{race_id}/join");
    let (status, joined) = common::post_json_as(app.clone(), &rider, &join_uri, &json!({})).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["competitors"], json!([rider]));

    // Act: join again
    let (status, _) = common::post_json_as(app.clone(), &rider, &join_uri, &json!({})).await;

    // Assert
    assert_eq!(status, StatusCode::CONFLICT);

    // Act: read back
    let (status, fetched) = common::get_json(app, &format!("/api/v1/races/{race_id}")).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["competitors"], json!([rider]));
    assert_eq!(bus.published_of_type("races.race_created").len(), 1);
    assert_eq!(bus.published_of_type("races.competitor_joined").len(), 1);
}

#[tokio::test]
async fn test_create_race_without_user_returns_401() {
    let app = common::build_test_app();

    let (status, _) = common::post_json(
        app,
        "/api/v1/races",
        &json!({ "name": "Spring Classic", "date": RACE_DATE }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_race_reports_every_invalid_field() {
    // Arrange
    let app = common::build_test_app();
    let owner = common::create_user(app.clone(), "Owner").await;

    // Act
    let (status, json) = common::post_json_as(
        app,
        &owner,
        "/api/v1/races",
        &json!({ "id": "bad", "name": "", "date": "2025-12-31T00:00:00Z" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
    assert_eq!(json["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_race_for_unregistered_owner_returns_404() {
    let app = common::build_test_app();

    let (status, _) = common::post_json_as(
        app,
        &Id::generate().to_string(),
        "/api/v1/races",
        &json!({ "name": "Spring Classic", "date": RACE_DATE }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_unknown_race_returns_404() {
    // Arrange
    let app = common::build_test_app();
    let rider = common::create_user(app.clone(), "Rider").await;

    // Act
    let (status, json) = common::post_json_as(
        app,
        &rider,
        &format!("/api/v1/races/{}/join", Id::generate()),
        &json!({}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_join_with_explicit_user_id() {
    // Arrange
    let app = common::build_test_app();
    let owner = common::create_user(app.clone(), "Owner").await;
    let rider = common::create_user(app.clone(), "Rider").await;
    let (_, created) = common::post_json_as(
        app.clone(),
        &owner,
        "/api/v1/races",
        &json!({ "name": "Hill Climb", "date": RACE_DATE }),
    )
    .await;
    let race_id = created["id"].as_str().unwrap();

    // Act
    let (status, joined) = common::post_json(
        app,
        &format!("/api/v1/races/{race_id}/join"),
        &json!({ "user_id": rider }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["competitors"], json!([rider]));
}

#[tokio::test]
async fn test_list_races_orders_by_date() {
    // Arrange
    let app = common::build_test_app();
    let owner = common::create_user(app.clone(), "Owner").await;
    for (name, date) in [
        ("Late", "2026-03-01T09:00:00Z"),
        ("Early", "2026-02-01T09:00:00Z"),
    ] {
        let (status, _) = common::post_json_as(
            app.clone(),
            &owner,
            "/api/v1/races",
            &json!({ "name": name, "date": date }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Act
    let (status, json) = common::get_json(app, "/api/v1/races").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|race| race["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Early", "Late"]);
}
