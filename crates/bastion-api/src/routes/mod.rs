//! Route modules organized by aggregate.

use axum::Router;
use bastion_core::details::ObjectDetails;
use serde::Serialize;

use crate::state::AppState;

pub mod health;
pub mod organizations;
pub mod targets;
pub mod users;

/// Response body of a successful Add.
#[derive(Debug, Serialize)]
pub struct AddResponse {
    /// Id of the new aggregate.
    pub id: String,
    pub details: ObjectDetails,
}

impl From<ObjectDetails> for AddResponse {
    fn from(details: ObjectDetails) -> Self {
        Self {
            id: details.id.clone(),
            details,
        }
    }
}

/// Response body of a successful Change or Delete.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub details: ObjectDetails,
}

impl From<ObjectDetails> for WriteResponse {
    fn from(details: ObjectDetails) -> Self {
        Self { details }
    }
}

/// The full application router, without middleware layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/v1/targets", targets::router())
        .nest("/v1/users", users::router())
        .nest("/v1/organizations", organizations::router())
        .with_state(state)
}
