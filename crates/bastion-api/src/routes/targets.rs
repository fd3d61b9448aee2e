//! Routes for the target aggregate.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use bastion_projection::query::{ListResponse, TargetSearchRequest};
use bastion_projection::query_handlers;
use bastion_projection::views::TargetView;
use bastion_target::application::command_handlers;
use bastion_target::domain::commands::{AddTarget, ChangeTarget, DeleteTarget};
use bastion_target::domain::events::TargetType;
use serde::Deserialize;
use tracing::instrument;

use super::{AddResponse, WriteResponse};
use crate::context::{command_context, require_resource_owner};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct AddTargetRequest {
    /// Caller-chosen id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub target_type: TargetType,
    pub url: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub interrupt_on_error: bool,
}

/// Request body for PATCH /{id}. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeTargetRequest {
    pub name: Option<String>,
    pub target_type: Option<TargetType>,
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub is_async: Option<bool>,
    pub interrupt_on_error: Option<bool>,
}

/// POST /
#[instrument(skip_all, fields(name = %request.name))]
async fn add_target(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddTargetRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);
    let command = AddTarget {
        aggregate_id: request.id,
        name: request.name,
        target_type: request.target_type,
        url: request.url,
        timeout: Duration::from_millis(request.timeout_ms),
        is_async: request.is_async,
        interrupt_on_error: request.interrupt_on_error,
    };

    let details = command_handlers::handle_add_target(
        &ctx,
        &command,
        resource_owner,
        state.clock.as_ref(),
        state.ids.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// PATCH /{id}
#[instrument(skip(state, headers, request))]
async fn change_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChangeTargetRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);
    let command = ChangeTarget {
        aggregate_id: id,
        name: request.name,
        target_type: request.target_type,
        url: request.url,
        timeout: request.timeout_ms.map(Duration::from_millis),
        is_async: request.is_async,
        interrupt_on_error: request.interrupt_on_error,
    };

    let details = command_handlers::handle_change_target(
        &ctx,
        &command,
        resource_owner,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// DELETE /{id}
#[instrument(skip(state, headers))]
async fn delete_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WriteResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);

    let details = command_handlers::handle_delete_target(
        &ctx,
        &DeleteTarget { aggregate_id: id },
        resource_owner,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// GET /{id}
#[instrument(skip(state, headers))]
async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TargetView>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let view = query_handlers::get_target_by_id(&state.projection, resource_owner, &id)?;
    Ok(Json(view))
}

/// POST /_search
#[instrument(skip_all)]
async fn search_targets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TargetSearchRequest>,
) -> Result<Json<ListResponse<TargetView>>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let response = query_handlers::list_targets(&state.projection, resource_owner, &request)?;
    Ok(Json(response))
}

/// Returns the router for the target aggregate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_target))
        .route("/_search", post(search_targets))
        .route(
            "/{id}",
            get(get_target).patch(change_target).delete(delete_target),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bastion_core::repository::EventRepository;
    use bastion_projection::ProjectionStore;
    use bastion_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, RecordingEventRepository,
        SequenceIdGenerator, fixed_now,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::context::RESOURCE_OWNER_HEADER;

    fn app_state_with(event_repository: Arc<dyn EventRepository>) -> AppState {
        AppState::new(
            event_repository,
            Arc::new(ProjectionStore::new()),
            Arc::new(FixedClock(fixed_now())),
            Arc::new(SequenceIdGenerator::new(["t-1"])),
            Duration::from_secs(5),
        )
    }

    fn add_request(owner: Option<&str>) -> Request<Body> {
        let body = serde_json::json!({
            "name": "T1",
            "target_type": "webhook",
            "url": "https://example.com",
            "timeout_ms": 5000,
        });
        let mut builder = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json");
        if let Some(owner) = owner {
            builder = builder.header(RESOURCE_OWNER_HEADER, owner);
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_add_target_returns_id_and_details() {
        // Arrange
        let repo = Arc::new(RecordingEventRepository::new(Vec::new()));
        let app = router().with_state(app_state_with(repo.clone()));

        // Act
        let response = app.oneshot(add_request(Some("org-1"))).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["id"], "t-1");
        assert_eq!(json["details"]["resource_owner"], "org-1");
        assert_eq!(json["details"]["sequence"], 1);
        let appended = repo.appended_events();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].2[0].payload["timeout"]["secs"], 5);
    }

    #[tokio::test]
    async fn test_add_target_without_owner_header_returns_400() {
        let app = router().with_state(app_state_with(Arc::new(EmptyEventRepository)));

        let response = app.oneshot(add_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_add_target_returns_500_when_repository_fails() {
        let app = router().with_state(app_state_with(Arc::new(FailingEventRepository)));

        let response = app.oneshot(add_request(Some("org-1"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_change_unknown_target_returns_404() {
        // Arrange
        let app = router().with_state(app_state_with(Arc::new(EmptyEventRepository)));
        let request = Request::builder()
            .method("PATCH")
            .uri("/t-404")
            .header("content-type", "application/json")
            .header(RESOURCE_OWNER_HEADER, "org-1")
            .body(Body::from(r#"{"name":"T2"}"#))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn test_add_target_with_unknown_type_returns_422() {
        let app = router().with_state(app_state_with(Arc::new(EmptyEventRepository)));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .header(RESOURCE_OWNER_HEADER, "org-1")
            .body(Body::from(
                r#"{"name":"T1","target_type":"carrier_pigeon","url":"https://example.com","timeout_ms":1}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        // Axum returns 422 for deserialization failures.
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
