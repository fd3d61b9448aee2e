//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::AggregateRef;
use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: String,
    /// Tenant owning the aggregate.
    pub resource_owner: String,
    /// Monotonically increasing version within the aggregate stream.
    pub sequence_number: i64,
    /// The user or system principal that caused the event.
    pub actor: String,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl From<&StoredEvent> for EventMetadata {
    fn from(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            aggregate_id: stored.aggregate_id.clone(),
            resource_owner: stored.resource_owner.clone(),
            sequence_number: stored.sequence_number,
            actor: stored.actor.clone(),
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        }
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Decodes a stored event. Returns `Ok(None)` for event types this
    /// aggregate does not know, so newer events never break older readers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a known event type carries a
    /// payload that does not deserialize.
    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError>
    where
        Self: Sized;
}

/// Deserializes an event payload, mapping failures to infrastructure errors.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload does not match `T`.
pub fn decode_payload<T: serde::de::DeserializeOwned>(
    stored: &StoredEvent,
) -> Result<T, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| {
        DomainError::Infrastructure(format!(
            "event deserialization failed for {} at sequence {}: {e}",
            stored.event_type, stored.sequence_number
        ))
    })
}

/// Converts a domain event into its stored representation.
#[must_use]
pub fn to_stored_event<E: DomainEvent>(aggregate: &AggregateRef, event: &E) -> StoredEvent {
    let meta = event.metadata();
    StoredEvent {
        event_id: meta.event_id,
        aggregate_type: aggregate.aggregate_type.to_owned(),
        aggregate_id: meta.aggregate_id.clone(),
        resource_owner: meta.resource_owner.clone(),
        event_type: event.event_type().to_owned(),
        payload: event.to_payload(),
        sequence_number: meta.sequence_number,
        position: 0,
        actor: meta.actor.clone(),
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    }
}
