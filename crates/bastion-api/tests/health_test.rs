//! Integration tests for the health endpoint.

mod common;

use axum::http::{Method, StatusCode};

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = common::build_test_app(&[]);

    let (status, json) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["processed_position"], 0);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_test_app(&[]);

    let (status, _) = app.send(Method::GET, "/v1/nonexistent", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
