//! Command handlers for the user aggregate.

use bastion_core::aggregate::AggregateRoot;
use bastion_core::clock::Clock;
use bastion_core::command::{Command, CommandContext, require_resource_owner};
use bastion_core::details::ObjectDetails;
use bastion_core::error::DomainError;
use bastion_core::id::IdGenerator;
use bastion_core::repository::EventRepository;
use bastion_core::write_model::{load_write_model, push_and_reduce};
use tracing::{debug, info, instrument};

use crate::domain::aggregates::HumanUserWriteModel;
use crate::domain::commands::{AddHumanUser, ChangeHumanUser, RemoveUser};
use crate::domain::events::USER_AGGREGATE_TYPE;

async fn load_existing(
    ctx: &CommandContext,
    repo: &dyn EventRepository,
    id: &str,
    resource_owner: &str,
) -> Result<HumanUserWriteModel, DomainError> {
    let model = load_write_model(ctx, repo, HumanUserWriteModel::new(id, resource_owner)).await?;
    if !model.state().exists() {
        return Err(DomainError::not_found(USER_AGGREGATE_TYPE, id));
    }
    Ok(model)
}

/// Handles `AddHumanUser`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a malformed request,
/// `DomainError::ConcurrencyConflict` if the id is already taken, or any
/// store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, user_id = tracing::field::Empty)
)]
pub async fn handle_add_human_user(
    ctx: &CommandContext,
    command: &AddHumanUser,
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
    tracing::Span::current().record("user_id", id.as_str());

    let mut model = HumanUserWriteModel::new(id, resource_owner);
    model.add(command, ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "human user added");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `ChangeHumanUser`. A request that changes nothing returns the
/// current details without appending.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument`, `DomainError::NotFound`,
/// `DomainError::ConcurrencyConflict` or any store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, user_id = %command.aggregate_id)
)]
pub async fn handle_change_human_user(
    ctx: &CommandContext,
    command: &ChangeHumanUser,
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

    info!(sequence = model.version(), "human user changed");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `RemoveUser`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument`, `DomainError::NotFound` or any
/// store error.
#[instrument(
    skip_all,
    fields(resource_owner = %resource_owner, user_id = %command.aggregate_id)
)]
pub async fn handle_remove_user(
    ctx: &CommandContext,
    command: &RemoveUser,
    resource_owner: &str,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    require_resource_owner(resource_owner)?;
    command.validate()?;

    let mut model = load_existing(ctx, repo, &command.aggregate_id, resource_owner).await?;
    model.remove(ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "user removed");
    Ok(ObjectDetails::from(model.root()))
}
