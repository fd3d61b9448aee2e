//! Read-only view DTOs materialized by the projector.

use std::time::Duration;

use bastion_core::repository::StoredEvent;
use bastion_organization::domain::events::{OrganizationAdded, OrganizationChanged};
use bastion_target::domain::events::{TargetAdded, TargetChanged, TargetType};
use bastion_user::domain::events::{HumanUserAdded, HumanUserChanged};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Bookkeeping shared by all views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewDetails {
    pub id: String,
    pub resource_owner: String,
    /// Sequence of the last event folded into the view.
    pub sequence: i64,
    pub creation_date: DateTime<Utc>,
    pub change_date: DateTime<Utc>,
}

impl ViewDetails {
    fn created(stored: &StoredEvent) -> Self {
        Self {
            id: stored.aggregate_id.clone(),
            resource_owner: stored.resource_owner.clone(),
            sequence: stored.sequence_number,
            creation_date: stored.occurred_at,
            change_date: stored.occurred_at,
        }
    }

    fn touch(&mut self, stored: &StoredEvent) {
        self.sequence = stored.sequence_number;
        self.change_date = stored.occurred_at;
    }
}

/// Queryable state of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetView {
    pub details: ViewDetails,
    pub name: String,
    pub target_type: TargetType,
    pub url: String,
    pub timeout: Duration,
    pub is_async: bool,
    pub interrupt_on_error: bool,
}

impl TargetView {
    pub(crate) fn added(stored: &StoredEvent, added: TargetAdded) -> Self {
        Self {
            details: ViewDetails::created(stored),
            name: added.name,
            target_type: added.target_type,
            url: added.url,
            timeout: added.timeout,
            is_async: added.is_async,
            interrupt_on_error: added.interrupt_on_error,
        }
    }

    pub(crate) fn changed(&mut self, stored: &StoredEvent, change: TargetChanged) {
        if let Some(name) = change.name {
            self.name = name;
        }
        if let Some(target_type) = change.target_type {
            self.target_type = target_type;
        }
        if let Some(url) = change.url {
            self.url = url;
        }
        if let Some(timeout) = change.timeout {
            self.timeout = timeout;
        }
        if let Some(is_async) = change.is_async {
            self.is_async = is_async;
        }
        if let Some(interrupt_on_error) = change.interrupt_on_error {
            self.interrupt_on_error = interrupt_on_error;
        }
        self.details.touch(stored);
    }
}

/// Queryable state of a human user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub details: ViewDetails,
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub display_name: String,
    pub preferred_language: String,
}

impl UserView {
    pub(crate) fn added(stored: &StoredEvent, added: HumanUserAdded) -> Self {
        Self {
            details: ViewDetails::created(stored),
            username: added.username,
            email: added.email,
            given_name: added.given_name,
            family_name: added.family_name,
            display_name: added.display_name,
            preferred_language: added.preferred_language,
        }
    }

    pub(crate) fn changed(&mut self, stored: &StoredEvent, change: HumanUserChanged) {
        let fields = [
            (change.username, &mut self.username),
            (change.email, &mut self.email),
            (change.given_name, &mut self.given_name),
            (change.family_name, &mut self.family_name),
            (change.display_name, &mut self.display_name),
            (change.preferred_language, &mut self.preferred_language),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                *field = value;
            }
        }
        self.details.touch(stored);
    }
}

/// Queryable state of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationView {
    pub details: ViewDetails,
    pub name: String,
}

impl OrganizationView {
    pub(crate) fn added(stored: &StoredEvent, added: OrganizationAdded) -> Self {
        Self {
            details: ViewDetails::created(stored),
            name: added.name,
        }
    }

    pub(crate) fn changed(&mut self, stored: &StoredEvent, change: OrganizationChanged) {
        self.name = change.name;
        self.details.touch(stored);
    }
}

/// Access to the shared bookkeeping of any view.
pub trait View: Clone {
    fn details(&self) -> &ViewDetails;
}

impl View for TargetView {
    fn details(&self) -> &ViewDetails {
        &self.details
    }
}

impl View for UserView {
    fn details(&self) -> &ViewDetails {
        &self.details
    }
}

impl View for OrganizationView {
    fn details(&self) -> &ViewDetails {
        &self.details
    }
}
