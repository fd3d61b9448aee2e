//! Integration tests for the organization routes.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_organization_lifecycle_over_http() {
    let app = common::build_test_app(&["org-1"]);

    let (status, json) = app
        .send(Method::POST, "/v1/organizations", None, Some(json!({ "name": "ACME" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["resource_owner"], "org-1");

    let (status, json) = app
        .send(
            Method::PATCH,
            "/v1/organizations/org-1",
            None,
            Some(json!({ "name": "ACME Corp" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["sequence"], 2);

    app.project().await;
    let (status, json) = app.send(Method::GET, "/v1/organizations/org-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "ACME Corp");

    let (status, _) = app.send(Method::DELETE, "/v1/organizations/org-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    app.project().await;
    let (_, json) = app
        .send(Method::POST, "/v1/organizations/_search", None, Some(json!({})))
        .await;
    assert_eq!(json["details"]["total_count"], 0);
}

#[tokio::test]
async fn test_empty_organization_name_returns_400() {
    let app = common::build_test_app(&["org-1"]);

    let (status, json) = app
        .send(Method::POST, "/v1/organizations", None, Some(json!({ "name": "" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");
}

#[tokio::test]
async fn test_search_reports_freshness_before_first_poll() {
    let app = common::build_test_app(&[]);

    let (status, json) = app
        .send(Method::POST, "/v1/organizations/_search", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"]["processed_position"], 0);
    assert!(json["details"]["timestamp"].is_string());
}
