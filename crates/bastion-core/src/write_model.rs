//! Generic write-model reduction.
//!
//! A write model is a pure fold over its aggregate's events in strict
//! sequence order. These functions drive that fold for any
//! [`AggregateRoot`]: loading and replaying history, and pushing freshly
//! produced events before folding them into the same instance.

use tracing::{debug, instrument};

use crate::aggregate::AggregateRoot;
use crate::command::CommandContext;
use crate::error::DomainError;
use crate::event::{DomainEvent, to_stored_event};
use crate::repository::{EventRepository, StoredEvent};

/// Folds `events` into `model` in order.
///
/// Event types the aggregate does not know only advance the sequence.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if an event does not directly
/// follow the model's current sequence or a known payload fails to decode.
pub fn reduce<A: AggregateRoot>(model: &mut A, events: &[StoredEvent]) -> Result<(), DomainError> {
    for stored in events {
        let expected = model.version() + 1;
        if stored.sequence_number != expected {
            return Err(DomainError::Infrastructure(format!(
                "sequence gap on aggregate {}: expected {expected}, found {}",
                model.aggregate_ref(),
                stored.sequence_number
            )));
        }
        let decoded = A::Event::from_stored(stored)?;
        model.root_mut().track(stored);
        if let Some(event) = decoded {
            model.apply(&event);
        }
    }
    Ok(())
}

/// Loads the full history of `model`'s aggregate and reduces it.
///
/// # Errors
///
/// Returns `DomainError::DeadlineExceeded` if the context expires before the
/// load completes, or any error from the repository or [`reduce`].
#[instrument(skip_all, fields(aggregate = %model.aggregate_ref()))]
pub async fn load_write_model<A: AggregateRoot>(
    ctx: &CommandContext,
    repo: &dyn EventRepository,
    mut model: A,
) -> Result<A, DomainError> {
    ctx.ensure_active()?;
    let events = ctx
        .within_deadline(repo.load_events(model.aggregate_ref()))
        .await?;
    reduce(&mut model, &events)?;
    debug!(sequence = model.version(), "write model loaded");
    Ok(model)
}

/// Pushes `model`'s uncommitted events conditioned on its current version,
/// then folds them into `model`. Does nothing when there are no uncommitted
/// events.
///
/// The deadline is checked before the append; the append itself is never
/// abandoned halfway.
///
/// # Errors
///
/// Returns `DomainError::DeadlineExceeded` if the context already expired,
/// `DomainError::ConcurrencyConflict` if another writer advanced the
/// aggregate, or any other repository error.
pub async fn push_and_reduce<A: AggregateRoot>(
    ctx: &CommandContext,
    repo: &dyn EventRepository,
    model: &mut A,
) -> Result<Vec<StoredEvent>, DomainError> {
    if model.uncommitted_events().is_empty() {
        return Ok(Vec::new());
    }
    let aggregate = model.aggregate_ref().clone();
    let stored_events: Vec<StoredEvent> = model
        .uncommitted_events()
        .iter()
        .map(|event| to_stored_event(&aggregate, event))
        .collect();

    ctx.ensure_active()?;
    let new_version = repo
        .append_events(&aggregate, model.version(), &stored_events)
        .await?;

    model.clear_uncommitted_events();
    reduce(model, &stored_events)?;
    debug_assert_eq!(model.version(), new_version);

    Ok(stored_events)
}
