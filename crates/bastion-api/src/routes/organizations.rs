//! Routes for the organization aggregate. Organizations own themselves, so
//! no resource owner header is read here.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use bastion_organization::application::command_handlers;
use bastion_organization::domain::commands::{
    AddOrganization, ChangeOrganization, RemoveOrganization,
};
use bastion_projection::query::{ListResponse, OrganizationSearchRequest};
use bastion_projection::query_handlers;
use bastion_projection::views::OrganizationView;
use serde::Deserialize;
use tracing::instrument;

use super::{AddResponse, WriteResponse};
use crate::context::command_context;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct AddOrganizationRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Request body for PATCH /{id}.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeOrganizationRequest {
    pub name: Option<String>,
}

/// POST /
#[instrument(skip_all, fields(name = %request.name))]
async fn add_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddOrganizationRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let ctx = command_context(&state, &headers);
    let command = AddOrganization {
        aggregate_id: request.id,
        name: request.name,
    };

    let details = command_handlers::handle_add_organization(
        &ctx,
        &command,
        state.clock.as_ref(),
        state.ids.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// PATCH /{id}
#[instrument(skip(state, headers, request))]
async fn change_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChangeOrganizationRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let ctx = command_context(&state, &headers);
    let command = ChangeOrganization {
        aggregate_id: id,
        name: request.name,
    };

    let details = command_handlers::handle_change_organization(
        &ctx,
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// DELETE /{id}
#[instrument(skip(state, headers))]
async fn remove_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WriteResponse>, ApiError> {
    let ctx = command_context(&state, &headers);

    let details = command_handlers::handle_remove_organization(
        &ctx,
        &RemoveOrganization { aggregate_id: id },
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(details.into()))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrganizationView>, ApiError> {
    let view = query_handlers::get_organization_by_id(&state.projection, &id)?;
    Ok(Json(view))
}

/// POST /_search
#[instrument(skip_all)]
async fn search_organizations(
    State(state): State<AppState>,
    Json(request): Json<OrganizationSearchRequest>,
) -> Result<Json<ListResponse<OrganizationView>>, ApiError> {
    let response = query_handlers::list_organizations(&state.projection, &request)?;
    Ok(Json(response))
}

/// Returns the router for the organization aggregate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_organization))
        .route("/_search", post(search_organizations))
        .route(
            "/{id}",
            get(get_organization)
                .patch(change_organization)
                .delete(remove_organization),
        )
}
