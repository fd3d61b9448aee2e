//! Command handlers for the Target aggregate.
//!
//! Each handler validates the request before touching the store, loads the
//! write model where needed, records at most one event and pushes it
//! conditioned on the sequence it loaded.

use bastion_core::aggregate::AggregateRoot;
use bastion_core::clock::Clock;
use bastion_core::command::{Command, CommandContext, require_resource_owner};
use bastion_core::details::ObjectDetails;
use bastion_core::error::DomainError;
use bastion_core::id::IdGenerator;
use bastion_core::repository::EventRepository;
use bastion_core::write_model::{load_write_model, push_and_reduce};
use tracing::{debug, info, instrument};

use crate::domain::aggregates::TargetWriteModel;
use crate::domain::commands::{AddTarget, ChangeTarget, DeleteTarget};
use crate::domain::events::TARGET_AGGREGATE_TYPE;

/// Loads a target and fails with `NotFound` unless it is active.
async fn load_existing(
    ctx: &CommandContext,
    repo: &dyn EventRepository,
    id: &str,
    resource_owner: &str,
) -> Result<TargetWriteModel, DomainError> {
    let model = load_write_model(ctx, repo, TargetWriteModel::new(id, resource_owner)).await?;
    if !model.state().exists() {
        return Err(DomainError::not_found(TARGET_AGGREGATE_TYPE, id));
    }
    Ok(model)
}

/// Handles `AddTarget`: validates, assigns an id if none was requested and
/// pushes a `TargetAdded` event.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a malformed request,
/// `DomainError::ConcurrencyConflict` if the id is already taken, or any
/// store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, target_id = tracing::field::Empty)
)]
pub async fn handle_add_target(
    ctx: &CommandContext,
    command: &AddTarget,
    resource_owner: &str,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    require_resource_owner(resource_owner)?;
    command.validate()?;

    let id = command
        .requested_id()
        .map_or_else(|| ids.next_id(), str::to_owned);
    tracing::Span::current().record("target_id", id.as_str());

    let mut model = TargetWriteModel::new(id, resource_owner);
    model.add(command, ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "target added");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `ChangeTarget`: pushes a `TargetChanged` event with the fields
/// that differ. A request that changes nothing returns the current details
/// without appending.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a malformed request,
/// `DomainError::NotFound` if the target does not exist or was removed,
/// `DomainError::ConcurrencyConflict` if another writer got there first, or
/// any store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, target_id = %command.aggregate_id)
)]
pub async fn handle_change_target(
    ctx: &CommandContext,
    command: &ChangeTarget,
    resource_owner: &str,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    require_resource_owner(resource_owner)?;
    command.validate()?;

    let mut model = load_existing(ctx, repo, &command.aggregate_id, resource_owner).await?;
    if !model.change(command, ctx, clock) {
        debug!(sequence = model.version(), "no field changed, nothing to push");
        return Ok(ObjectDetails::from(model.root()));
    }
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "target changed");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `DeleteTarget`: pushes a terminal `TargetRemoved` event.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a missing id or owner,
/// `DomainError::NotFound` if the target does not exist or was removed, or
/// any store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, target_id = %command.aggregate_id)
)]
pub async fn handle_delete_target(
    ctx: &CommandContext,
    command: &DeleteTarget,
    resource_owner: &str,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    require_resource_owner(resource_owner)?;
    command.validate()?;

    let mut model = load_existing(ctx, repo, &command.aggregate_id, resource_owner).await?;
    model.remove(ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "target removed");
    Ok(ObjectDetails::from(model.root()))
}
