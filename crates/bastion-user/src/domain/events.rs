//! Domain events for the user aggregate.

use bastion_core::error::DomainError;
use bastion_core::event::{DomainEvent, EventMetadata, decode_payload};
use bastion_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};

/// Aggregate type under which user events are stored.
pub const USER_AGGREGATE_TYPE: &str = "user";

pub const HUMAN_USER_ADDED_EVENT_TYPE: &str = "user.human.added";
pub const HUMAN_USER_CHANGED_EVENT_TYPE: &str = "user.human.changed";
pub const USER_REMOVED_EVENT_TYPE: &str = "user.removed";

/// Emitted when a human user is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanUserAdded {
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub display_name: String,
    pub preferred_language: String,
}

/// Emitted when profile fields change. Carries only the changed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanUserChanged {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

impl HumanUserChanged {
    /// Whether no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Emitted when a user is removed. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    /// Username at the time of removal.
    pub username: String,
}

/// Event payload variants for the user aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEventKind {
    Added(HumanUserAdded),
    Changed(HumanUserChanged),
    Removed(UserRemoved),
}

impl UserEventKind {
    /// The stored event type of this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Added(_) => HUMAN_USER_ADDED_EVENT_TYPE,
            Self::Changed(_) => HUMAN_USER_CHANGED_EVENT_TYPE,
            Self::Removed(_) => USER_REMOVED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the user aggregate.
#[derive(Debug, Clone)]
pub struct UserEvent {
    pub metadata: EventMetadata,
    pub kind: UserEventKind,
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        let payload = match &self.kind {
            UserEventKind::Added(p) => serde_json::to_value(p),
            UserEventKind::Changed(p) => serde_json::to_value(p),
            UserEventKind::Removed(p) => serde_json::to_value(p),
        };
        payload.expect("user event serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError> {
        let kind = match stored.event_type.as_str() {
            HUMAN_USER_ADDED_EVENT_TYPE => UserEventKind::Added(decode_payload(stored)?),
            HUMAN_USER_CHANGED_EVENT_TYPE => UserEventKind::Changed(decode_payload(stored)?),
            USER_REMOVED_EVENT_TYPE => UserEventKind::Removed(decode_payload(stored)?),
            _ => return Ok(None),
        };
        Ok(Some(Self {
            metadata: EventMetadata::from(stored),
            kind,
        }))
    }
}
