//! Routes for the human user aggregate.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use bastion_projection::query::{ListResponse, UserSearchRequest};
use bastion_projection::query_handlers;
use bastion_projection::views::UserView;
use bastion_user::application::command_handlers;
use bastion_user::domain::commands::{AddHumanUser, ChangeHumanUser, RemoveUser};
use serde::Deserialize;
use tracing::instrument;

use super::{AddResponse, WriteResponse};
use crate::context::{command_context, require_resource_owner, resource_owner};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct AddHumanUserRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// Request body for PATCH /{id}.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeHumanUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub display_name: Option<String>,
    pub preferred_language: Option<String>,
}

/// POST /
#[instrument(skip_all, fields(username = %request.username))]
async fn add_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddHumanUserRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);
    let command = AddHumanUser {
        aggregate_id: request.id,
        username: request.username,
        email: request.email,
        given_name: request.given_name,
        family_name: request.family_name,
        display_name: request.display_name,
        preferred_language: request.preferred_language,
    };

    let details = command_handlers::handle_add_human_user(
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
async fn change_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChangeHumanUserRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);
    let command = ChangeHumanUser {
        aggregate_id: id,
        username: request.username,
        email: request.email,
        given_name: request.given_name,
        family_name: request.family_name,
        display_name: request.display_name,
        preferred_language: request.preferred_language,
    };

    let details = command_handlers::handle_change_human_user(
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
async fn remove_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WriteResponse>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let ctx = command_context(&state, &headers);

    let details = command_handlers::handle_remove_user(
        &ctx,
        &RemoveUser { aggregate_id: id },
        resource_owner,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// GET /{id}
#[instrument(skip(state, headers))]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UserView>, ApiError> {
    let resource_owner = require_resource_owner(&headers)?;
    let view = query_handlers::get_user_by_id(&state.projection, resource_owner, &id)?;
    Ok(Json(view))
}

/// POST /_search
///
/// Without the resource owner header users of every owner are searched.
#[instrument(skip_all)]
async fn search_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UserSearchRequest>,
) -> Result<Json<ListResponse<UserView>>, ApiError> {
    let response =
        query_handlers::list_users(&state.projection, resource_owner(&headers), &request)?;
    Ok(Json(response))
}

/// Returns the router for the user aggregate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_user))
        .route("/_search", post(search_users))
        .route("/{id}", get(get_user).patch(change_user).delete(remove_user))
}
