//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use racers_api::app;
use racers_api::context::USER_ID_HEADER;
use racers_api::metrics::HttpMetrics;
use racers_api::state::AppState;
use racers_core::clock::Clock;
use racers_core::event_bus::InMemoryEventBus;
use racers_test_support::FixedClock;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Fixed timestamp used across all integration tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Build the full app router over in-memory storage with a fixed clock.
pub fn build_test_app() -> Router {
    build_test_app_with_bus(InMemoryEventBus::new())
}

/// Like [`build_test_app`], publishing to `bus` so tests can inspect events.
pub fn build_test_app_with_bus(bus: InMemoryEventBus) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
    app::router(
        AppState::in_memory_with_bus(bus, clock),
        Arc::new(HttpMetrics::new().unwrap()),
        Duration::from_secs(5),
    )
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send an anonymous POST request with a JSON body and return the response.
pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, "POST", uri, None, Some(body)).await
}

/// Send a POST request on behalf of `user`.
pub async fn post_json_as(
    app: Router,
    user: &str,
    uri: &str,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(user), Some(body)).await
}

/// Send an anonymous GET request and return the status and raw body text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Send an anonymous GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None, None).await
}

/// Send a GET request on behalf of `user`.
pub async fn get_json_as(app: Router, user: &str, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(user), None).await
}

/// Register a user and return its id.
pub async fn create_user(app: Router, name: &str) -> String {
    let (status, json) = post_json(app, "/api/v1/users", &json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}
