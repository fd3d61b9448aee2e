//! Domain events for the Target aggregate.

use std::time::Duration;

use bastion_core::error::DomainError;
use bastion_core::event::{DomainEvent, EventMetadata, decode_payload};
use bastion_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};

/// Aggregate type under which target events are stored.
pub const TARGET_AGGREGATE_TYPE: &str = "target";

/// Event type for `TargetAdded`.
pub const TARGET_ADDED_EVENT_TYPE: &str = "target.added";
/// Event type for `TargetChanged`.
pub const TARGET_CHANGED_EVENT_TYPE: &str = "target.changed";
/// Event type for `TargetRemoved`.
pub const TARGET_REMOVED_EVENT_TYPE: &str = "target.removed";

/// How an action talks to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Fire a webhook; the response body is ignored.
    Webhook,
    /// Call the endpoint and use its response.
    RequestResponse,
}

/// Emitted when a target is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAdded {
    /// Display name.
    pub name: String,
    /// Call style.
    pub target_type: TargetType,
    /// Absolute endpoint URL.
    pub url: String,
    /// Call timeout.
    pub timeout: Duration,
    /// Whether the call runs asynchronously.
    pub is_async: bool,
    /// Whether a failing call interrupts the calling flow.
    pub interrupt_on_error: bool,
}

/// Emitted when at least one target field changes. Carries only the
/// changed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetChanged {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_on_error: Option<bool>,
}

impl TargetChanged {
    /// Whether no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Emitted when a target is deleted. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRemoved {
    /// Name at the time of removal.
    pub name: String,
}

/// Event payload variants for the Target aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEventKind {
    /// The target was created.
    Added(TargetAdded),
    /// Fields of the target changed.
    Changed(TargetChanged),
    /// The target was deleted.
    Removed(TargetRemoved),
}

impl TargetEventKind {
    /// The stored event type of this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Added(_) => TARGET_ADDED_EVENT_TYPE,
            Self::Changed(_) => TARGET_CHANGED_EVENT_TYPE,
            Self::Removed(_) => TARGET_REMOVED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Target aggregate.
#[derive(Debug, Clone)]
pub struct TargetEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: TargetEventKind,
}

impl DomainEvent for TargetEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        let payload = match &self.kind {
            TargetEventKind::Added(p) => serde_json::to_value(p),
            TargetEventKind::Changed(p) => serde_json::to_value(p),
            TargetEventKind::Removed(p) => serde_json::to_value(p),
        };
        payload.expect("target event serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError> {
        let kind = match stored.event_type.as_str() {
            TARGET_ADDED_EVENT_TYPE => TargetEventKind::Added(decode_payload(stored)?),
            TARGET_CHANGED_EVENT_TYPE => TargetEventKind::Changed(decode_payload(stored)?),
            TARGET_REMOVED_EVENT_TYPE => TargetEventKind::Removed(decode_payload(stored)?),
            _ => return Ok(None),
        };
        Ok(Some(Self {
            metadata: EventMetadata::from(stored),
            kind,
        }))
    }
}
