//! Integration tests for the Prometheus scrape endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_metrics_count_requests_by_matched_route() {
    let app = common::build_test_app();
    let user_id = common::create_user(app.clone(), "Ada").await;

    let (status, _) = common::get_json(app.clone(), &format!("/api/v1/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::get_text(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        r#"racers_http_requests_total{method="GET",route="/api/v1/users/{id}",status="200"} 1"#
    ));
    assert!(body.contains(r#"method="POST",route="/api/v1/users"#));
}

#[tokio::test]
async fn test_metrics_endpoint_does_not_count_itself() {
    let app = common::build_test_app();

    let (_, _) = common::get_text(app.clone(), "/metrics").await;
    let (status, body) = common::get_text(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(r#"route="/metrics""#));
}
