//! Event repository abstraction.
//!
//! The event log is the only shared mutable resource. Writers go through
//! `append_events`, which is conditioned on the version the writer last
//! observed; no other synchronization is used by the write path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::AggregateRef;
use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate type this event belongs to.
    pub aggregate_type: String,
    /// Aggregate this event belongs to.
    pub aggregate_id: String,
    /// Tenant owning the aggregate.
    pub resource_owner: String,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Global position in the log, assigned by the store (0 before append).
    pub position: i64,
    /// The principal that caused the event.
    pub actor: String,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Whether this event belongs to the given aggregate stream.
    #[must_use]
    pub fn belongs_to(&self, aggregate: &AggregateRef) -> bool {
        self.aggregate_type == aggregate.aggregate_type
            && self.aggregate_id == aggregate.aggregate_id
            && self.resource_owner == aggregate.resource_owner
    }
}

/// Repository trait for loading and appending domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    async fn load_events(&self, aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last known sequence number. Returns the new
    /// sequence number of the stream.
    ///
    /// Fails with `DomainError::ConcurrencyConflict` when the stream has
    /// advanced past `expected_version`.
    async fn append_events(
        &self,
        aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError>;

    /// Load up to `limit` events of any aggregate with a global position
    /// greater than `position`, ordered by position. Used by projectors.
    ///
    /// Implementations must only return events that no later commit can
    /// precede: once an event at position `p` has been returned, every event
    /// that becomes visible afterwards has a position above `p`. Positions
    /// may have gaps.
    async fn load_events_after(
        &self,
        position: i64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError>;
}

/// Checks that a batch continues the stream at `expected_version` without
/// gaps and belongs to `aggregate`. Shared by store implementations.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` describing the first offending event.
pub fn validate_append_batch(
    aggregate: &AggregateRef,
    expected_version: i64,
    events: &[StoredEvent],
) -> Result<(), DomainError> {
    for (offset, event) in (1_i64..).zip(events) {
        if !event.belongs_to(aggregate) {
            return Err(DomainError::Infrastructure(format!(
                "event {} does not belong to aggregate {aggregate}",
                event.event_id
            )));
        }
        if event.sequence_number != expected_version + offset {
            return Err(DomainError::Infrastructure(format!(
                "non-contiguous sequence for aggregate {aggregate}: expected {}, found {}",
                expected_version + offset,
                event.sequence_number
            )));
        }
    }
    Ok(())
}
