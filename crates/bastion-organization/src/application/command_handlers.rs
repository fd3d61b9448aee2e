//! Command handlers for the organization aggregate.
//!
//! Organizations own themselves, so none of these handlers take a separate
//! resource owner.

use bastion_core::aggregate::AggregateRoot;
use bastion_core::clock::Clock;
use bastion_core::command::{Command, CommandContext};
use bastion_core::details::ObjectDetails;
use bastion_core::error::DomainError;
use bastion_core::id::IdGenerator;
use bastion_core::repository::EventRepository;
use bastion_core::write_model::{load_write_model, push_and_reduce};
use tracing::{debug, info, instrument};

use crate::domain::aggregates::OrganizationWriteModel;
use crate::domain::commands::{AddOrganization, ChangeOrganization, RemoveOrganization};
use crate::domain::events::ORGANIZATION_AGGREGATE_TYPE;

async fn load_existing(
    ctx: &CommandContext,
    repo: &dyn EventRepository,
    id: &str,
) -> Result<OrganizationWriteModel, DomainError> {
    let model = load_write_model(ctx, repo, OrganizationWriteModel::new(id)).await?;
    if !model.state().exists() {
        return Err(DomainError::not_found(ORGANIZATION_AGGREGATE_TYPE, id));
    }
    Ok(model)
}

/// Handles `AddOrganization`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for an empty name,
/// `DomainError::ConcurrencyConflict` if the id is already taken, or any
/// store error.
#[instrument(skip_all, fields(org_id = tracing::field::Empty))]
pub async fn handle_add_organization(
    ctx: &CommandContext,
    command: &AddOrganization,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    command.validate()?;

    let id = command
        .requested_id()
        .map_or_else(|| ids.next_id(), str::to_owned);
    tracing::Span::current().record("org_id", id.as_str());

    let mut model = OrganizationWriteModel::new(id);
    model.add(&command.name, ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "organization added");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `ChangeOrganization`. Renaming to the current name is a no-op.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument`, `DomainError::NotFound`,
/// `DomainError::ConcurrencyConflict` or any store error.
#[instrument(skip_all, fields(org_id = %command.aggregate_id))]
pub async fn handle_change_organization(
    ctx: &CommandContext,
    command: &ChangeOrganization,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    command.validate()?;

    let mut model = load_existing(ctx, repo, &command.aggregate_id).await?;
    if !model.change(command.name.as_deref(), ctx, clock) {
        debug!(sequence = model.version(), "name unchanged, nothing to push");
        return Ok(ObjectDetails::from(model.root()));
    }
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "organization changed");
    Ok(ObjectDetails::from(model.root()))
}

/// Handles `RemoveOrganization`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument`, `DomainError::NotFound` or any
/// store error.
#[instrument(skip_all, fields(org_id = %command.aggregate_id))]
pub async fn handle_remove_organization(
    ctx: &CommandContext,
    command: &RemoveOrganization,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ObjectDetails, DomainError> {
    command.validate()?;

    let mut model = load_existing(ctx, repo, &command.aggregate_id).await?;
    model.remove(ctx, clock);
    push_and_reduce(ctx, repo, &mut model).await?;

    info!(sequence = model.version(), "organization removed");
    Ok(ObjectDetails::from(model.root()))
}

#[cfg(test)]
mod tests {
    use bastion_event_store::InMemoryEventRepository;
    use bastion_test_support::{FixedClock, SequenceIdGenerator, fixed_now};

    use super::*;

    #[tokio::test]
    async fn test_organization_owns_itself() {
        let ctx = CommandContext::new("tester");
        let ids = SequenceIdGenerator::new(["org-7"]);
        let repo = InMemoryEventRepository::new();
        let command = AddOrganization {
            aggregate_id: None,
            name: "ACME".to_owned(),
        };

        let details =
            handle_add_organization(&ctx, &command, &FixedClock(fixed_now()), &ids, &repo)
                .await
                .unwrap();

        assert_eq!(details.id, "org-7");
        assert_eq!(details.resource_owner, "org-7");
    }

    #[tokio::test]
    async fn test_rename_to_same_name_is_noop_and_remove_is_terminal() {
        // Arrange
        let ctx = CommandContext::new("tester");
        let clock = FixedClock(fixed_now());
        let ids = SequenceIdGenerator::new(["org-1"]);
        let repo = InMemoryEventRepository::new();
        handle_add_organization(
            &ctx,
            &AddOrganization {
                aggregate_id: None,
                name: "ACME".to_owned(),
            },
            &clock,
            &ids,
            &repo,
        )
        .await
        .unwrap();
        let same = ChangeOrganization {
            aggregate_id: "org-1".to_owned(),
            name: Some("ACME".to_owned()),
        };
        let remove = RemoveOrganization {
            aggregate_id: "org-1".to_owned(),
        };

        // Act
        let unchanged = handle_change_organization(&ctx, &same, &clock, &repo)
            .await
            .unwrap();
        let removed = handle_remove_organization(&ctx, &remove, &clock, &repo)
            .await
            .unwrap();
        let again = handle_remove_organization(&ctx, &remove, &clock, &repo).await;

        // Assert
        assert_eq!(unchanged.sequence, 1);
        assert_eq!(removed.sequence, 2);
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
        assert_eq!(repo.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let ctx = CommandContext::new("tester");
        let ids = SequenceIdGenerator::new(["org-1"]);
        let repo = InMemoryEventRepository::new();
        let command = AddOrganization {
            aggregate_id: None,
            name: " ".to_owned(),
        };

        let result =
            handle_add_organization(&ctx, &command, &FixedClock(fixed_now()), &ids, &repo).await;

        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        assert!(repo.is_empty().unwrap());
    }
}
