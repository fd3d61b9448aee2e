//! Query handlers over the projection store.
//!
//! All reads are eventually consistent: a write becomes visible once the
//! projector has processed it. List responses report how far the read model
//! has come through [`ListDetails`].

use bastion_core::error::DomainError;
use bastion_organization::domain::events::ORGANIZATION_AGGREGATE_TYPE;
use bastion_target::domain::events::TARGET_AGGREGATE_TYPE;
use bastion_user::domain::events::USER_AGGREGATE_TYPE;
use tracing::instrument;

use crate::query::{
    ListDetails, ListResponse, OrganizationSearchRequest, SearchRequest, SortingColumn,
    TargetSearchRequest, UserSearchRequest,
};
use crate::store::{ProjectionState, ProjectionStore};
use crate::views::{OrganizationView, TargetView, UserView, View};

fn require_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::invalid_argument("id must not be empty"));
    }
    Ok(())
}

/// Filters `views` with `keep`, then sorts and pages per `request`.
fn list<'a, V, Q, S>(
    state: &ProjectionState,
    views: impl Iterator<Item = &'a V>,
    request: &SearchRequest<Q, S>,
    keep: impl Fn(&V, &Q) -> bool,
) -> Result<ListResponse<V>, DomainError>
where
    V: View + 'a,
    S: SortingColumn<V>,
{
    let matches: Vec<V> = views
        .filter(|view| request.queries.iter().all(|q| keep(*view, q)))
        .cloned()
        .collect();
    let total_count = matches.len() as u64;
    let results = request.query.page(matches)?;
    Ok(ListResponse {
        results,
        details: ListDetails {
            total_count,
            processed_position: state.processed_position,
            timestamp: state.current_as_of,
        },
    })
}

/// Looks up one target of `resource_owner`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an empty id or
/// `DomainError::NotFound` if the target is unknown, removed, or not yet
/// projected.
#[instrument(skip(store))]
pub fn get_target_by_id(
    store: &ProjectionStore,
    resource_owner: &str,
    id: &str,
) -> Result<TargetView, DomainError> {
    require_id(id)?;
    store
        .read(|state| {
            state
                .targets
                .get(&(resource_owner.to_owned(), id.to_owned()))
                .cloned()
        })?
        .ok_or_else(|| DomainError::not_found(TARGET_AGGREGATE_TYPE, id))
}

/// Lists the targets of `resource_owner`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an oversized limit.
#[instrument(skip(store, request))]
pub fn list_targets(
    store: &ProjectionStore,
    resource_owner: &str,
    request: &TargetSearchRequest,
) -> Result<ListResponse<TargetView>, DomainError> {
    store.read(|state| {
        let owned = state
            .targets
            .values()
            .filter(|view| view.details.resource_owner == resource_owner);
        list(state, owned, request, |view, q| q.matches(view))
    })?
}

/// Looks up one human user of `resource_owner`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an empty id or
/// `DomainError::NotFound`.
#[instrument(skip(store))]
pub fn get_user_by_id(
    store: &ProjectionStore,
    resource_owner: &str,
    id: &str,
) -> Result<UserView, DomainError> {
    require_id(id)?;
    store
        .read(|state| {
            state
                .users
                .get(&(resource_owner.to_owned(), id.to_owned()))
                .cloned()
        })?
        .ok_or_else(|| DomainError::not_found(USER_AGGREGATE_TYPE, id))
}

/// Lists users. With a `resource_owner` only that owner's users are
/// considered; otherwise a `ResourceOwner` predicate can narrow the result.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an oversized limit.
#[instrument(skip(store, request))]
pub fn list_users(
    store: &ProjectionStore,
    resource_owner: Option<&str>,
    request: &UserSearchRequest,
) -> Result<ListResponse<UserView>, DomainError> {
    store.read(|state| {
        let scoped = state
            .users
            .values()
            .filter(|view| resource_owner.is_none_or(|owner| view.details.resource_owner == owner));
        list(state, scoped, request, |view, q| q.matches(view))
    })?
}

/// Looks up one organization.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an empty id or
/// `DomainError::NotFound`.
#[instrument(skip(store))]
pub fn get_organization_by_id(
    store: &ProjectionStore,
    id: &str,
) -> Result<OrganizationView, DomainError> {
    require_id(id)?;
    store
        .read(|state| {
            state
                .organizations
                .get(&(id.to_owned(), id.to_owned()))
                .cloned()
        })?
        .ok_or_else(|| DomainError::not_found(ORGANIZATION_AGGREGATE_TYPE, id))
}

/// Lists organizations.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an oversized limit.
#[instrument(skip(store, request))]
pub fn list_organizations(
    store: &ProjectionStore,
    request: &OrganizationSearchRequest,
) -> Result<ListResponse<OrganizationView>, DomainError> {
    store.read(|state| {
        list(state, state.organizations.values(), request, |view, q| {
            q.matches(view)
        })
    })?
}
