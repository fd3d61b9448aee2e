//! Aggregate root abstraction.
//!
//! Every concrete write model embeds a [`WriteModelRoot`] carrying identity,
//! sequence and lifecycle state, and implements [`AggregateRoot`] to fold its
//! own event payloads into type-specific fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::command::CommandContext;
use crate::event::{DomainEvent, EventMetadata};
use crate::repository::StoredEvent;

/// Identity of one aggregate instance: unique per resource owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateRef {
    /// The aggregate type, e.g. `"target"`.
    pub aggregate_type: &'static str,
    /// The aggregate id within the resource owner.
    pub aggregate_id: String,
    /// The owning tenant.
    pub resource_owner: String,
}

impl AggregateRef {
    /// Creates a new aggregate reference.
    #[must_use]
    pub fn new(
        aggregate_type: &'static str,
        aggregate_id: impl Into<String>,
        resource_owner: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id: aggregate_id.into(),
            resource_owner: resource_owner.into(),
        }
    }
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}",
            self.aggregate_type, self.aggregate_id, self.resource_owner
        )
    }
}

/// Lifecycle of an aggregate: `unspecified -> active -> removed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No creation event has been applied.
    #[default]
    Unspecified,
    /// Created and not removed.
    Active,
    /// Removed. Terminal.
    Removed,
}

impl LifecycleState {
    /// Whether the aggregate currently exists.
    #[must_use]
    pub fn exists(self) -> bool {
        self == Self::Active
    }
}

/// Identity and bookkeeping shared by every write model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteModelRoot {
    /// Aggregate identity.
    pub aggregate: AggregateRef,
    /// Sequence of the last applied event (0 when nothing was applied).
    pub sequence: i64,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Timestamp of the first applied event.
    pub creation_date: Option<DateTime<Utc>>,
    /// Timestamp of the last applied event.
    pub change_date: Option<DateTime<Utc>>,
}

impl WriteModelRoot {
    /// Creates an empty root for the given aggregate.
    #[must_use]
    pub fn new(aggregate: AggregateRef) -> Self {
        Self {
            aggregate,
            sequence: 0,
            state: LifecycleState::Unspecified,
            creation_date: None,
            change_date: None,
        }
    }

    /// Builds metadata for a new event that will follow `pending` events not
    /// yet pushed.
    #[must_use]
    pub fn event_metadata(
        &self,
        event_type: &str,
        pending: usize,
        ctx: &CommandContext,
        clock: &dyn Clock,
    ) -> EventMetadata {
        #[allow(clippy::cast_possible_wrap)]
        let sequence_number = self.sequence + pending as i64 + 1;
        EventMetadata {
            event_id: uuid::Uuid::now_v7(),
            event_type: event_type.to_owned(),
            aggregate_id: self.aggregate.aggregate_id.clone(),
            resource_owner: self.aggregate.resource_owner.clone(),
            sequence_number,
            actor: ctx.actor.clone(),
            correlation_id: ctx.correlation_id,
            causation_id: ctx.correlation_id,
            occurred_at: clock.now(),
        }
    }

    /// Records the bookkeeping of an applied event.
    pub(crate) fn track(&mut self, stored: &StoredEvent) {
        self.sequence = stored.sequence_number;
        self.creation_date.get_or_insert(stored.occurred_at);
        self.change_date = Some(stored.occurred_at);
    }
}

/// Trait for aggregate roots that reconstitute from event history.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the embedded root.
    fn root(&self) -> &WriteModelRoot;

    /// Returns the embedded root mutably.
    fn root_mut(&mut self) -> &mut WriteModelRoot;

    /// Apply an event to mutate type-specific state (used during reduction).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Returns the aggregate identity.
    fn aggregate_ref(&self) -> &AggregateRef {
        &self.root().aggregate
    }

    /// Returns the current version (sequence of the last applied event).
    fn version(&self) -> i64 {
        self.root().sequence
    }

    /// Returns the lifecycle state.
    fn state(&self) -> LifecycleState {
        self.root().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_state_exists() {
        assert!(!LifecycleState::Unspecified.exists());
        assert!(LifecycleState::Active.exists());
        assert!(!LifecycleState::Removed.exists());
    }

    #[test]
    fn test_aggregate_ref_display_includes_owner() {
        let aggregate = AggregateRef::new("target", "t-1", "org-1");

        assert_eq!(aggregate.to_string(), "target/t-1@org-1");
    }
}
