//! Domain events for the organization aggregate.

use bastion_core::error::DomainError;
use bastion_core::event::{DomainEvent, EventMetadata, decode_payload};
use bastion_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};

pub const ORGANIZATION_AGGREGATE_TYPE: &str = "org";

pub const ORGANIZATION_ADDED_EVENT_TYPE: &str = "org.added";
pub const ORGANIZATION_CHANGED_EVENT_TYPE: &str = "org.changed";
pub const ORGANIZATION_REMOVED_EVENT_TYPE: &str = "org.removed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationAdded {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationChanged {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRemoved {
    pub name: String,
}

/// Event payload variants for the organization aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationEventKind {
    Added(OrganizationAdded),
    Changed(OrganizationChanged),
    Removed(OrganizationRemoved),
}

impl OrganizationEventKind {
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Added(_) => ORGANIZATION_ADDED_EVENT_TYPE,
            Self::Changed(_) => ORGANIZATION_CHANGED_EVENT_TYPE,
            Self::Removed(_) => ORGANIZATION_REMOVED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the organization aggregate.
#[derive(Debug, Clone)]
pub struct OrganizationEvent {
    pub metadata: EventMetadata,
    pub kind: OrganizationEventKind,
}

impl DomainEvent for OrganizationEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        let payload = match &self.kind {
            OrganizationEventKind::Added(p) => serde_json::to_value(p),
            OrganizationEventKind::Changed(p) => serde_json::to_value(p),
            OrganizationEventKind::Removed(p) => serde_json::to_value(p),
        };
        payload.expect("organization event serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError> {
        let kind = match stored.event_type.as_str() {
            ORGANIZATION_ADDED_EVENT_TYPE => OrganizationEventKind::Added(decode_payload(stored)?),
            ORGANIZATION_CHANGED_EVENT_TYPE => {
                OrganizationEventKind::Changed(decode_payload(stored)?)
            }
            ORGANIZATION_REMOVED_EVENT_TYPE => {
                OrganizationEventKind::Removed(decode_payload(stored)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(Self {
            metadata: EventMetadata::from(stored),
            kind,
        }))
    }
}
