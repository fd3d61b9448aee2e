//! In-memory projection store.
//!
//! Holds the materialized views plus the position of the last event folded
//! into them. Only the projector writes; query handlers read snapshots
//! through [`ProjectionStore::read`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use bastion_core::error::DomainError;
use bastion_core::event::DomainEvent;
use bastion_core::repository::StoredEvent;
use bastion_organization::domain::events::{
    ORGANIZATION_AGGREGATE_TYPE, OrganizationEvent, OrganizationEventKind,
};
use bastion_target::domain::events::{TARGET_AGGREGATE_TYPE, TargetEvent, TargetEventKind};
use bastion_user::domain::events::{USER_AGGREGATE_TYPE, UserEvent, UserEventKind};
use chrono::{DateTime, Utc};
use tracing::{error, trace};

use crate::views::{OrganizationView, TargetView, UserView, View};

/// `(resource_owner, id)`.
pub type ViewKey = (String, String);

fn key(stored: &StoredEvent) -> ViewKey {
    (stored.resource_owner.clone(), stored.aggregate_id.clone())
}

/// Whether `stored` is newer than what `view` already reflects.
fn is_newer<V: View>(view: &V, stored: &StoredEvent) -> bool {
    stored.sequence_number > view.details().sequence
}

/// The materialized read state.
#[derive(Debug)]
pub struct ProjectionState {
    pub targets: BTreeMap<ViewKey, TargetView>,
    pub users: BTreeMap<ViewKey, UserView>,
    pub organizations: BTreeMap<ViewKey, OrganizationView>,
    /// Global position of the last event consumed.
    pub processed_position: i64,
    /// When the views last reflected the log up to `processed_position`.
    /// Starts at the store's creation time.
    pub current_as_of: DateTime<Utc>,
}

impl ProjectionState {
    fn apply(&mut self, stored: &StoredEvent) -> Result<(), DomainError> {
        match stored.aggregate_type.as_str() {
            TARGET_AGGREGATE_TYPE => {
                if let Some(event) = TargetEvent::from_stored(stored)? {
                    self.apply_target(stored, event);
                }
            }
            USER_AGGREGATE_TYPE => {
                if let Some(event) = UserEvent::from_stored(stored)? {
                    self.apply_user(stored, event);
                }
            }
            ORGANIZATION_AGGREGATE_TYPE => {
                if let Some(event) = OrganizationEvent::from_stored(stored)? {
                    self.apply_organization(stored, event);
                }
            }
            other => trace!(aggregate_type = other, "no view for aggregate type"),
        }
        Ok(())
    }

    fn apply_target(&mut self, stored: &StoredEvent, event: TargetEvent) {
        let key = key(stored);
        match event.kind {
            TargetEventKind::Added(added) => {
                if !self.targets.get(&key).is_some_and(|v| !is_newer(v, stored)) {
                    self.targets.insert(key, TargetView::added(stored, added));
                }
            }
            TargetEventKind::Changed(change) => {
                if let Some(view) = self.targets.get_mut(&key).filter(|v| is_newer(&**v, stored)) {
                    view.changed(stored, change);
                }
            }
            TargetEventKind::Removed(_) => {
                self.targets.remove(&key);
            }
        }
    }

    fn apply_user(&mut self, stored: &StoredEvent, event: UserEvent) {
        let key = key(stored);
        match event.kind {
            UserEventKind::Added(added) => {
                if !self.users.get(&key).is_some_and(|v| !is_newer(v, stored)) {
                    self.users.insert(key, UserView::added(stored, added));
                }
            }
            UserEventKind::Changed(change) => {
                if let Some(view) = self.users.get_mut(&key).filter(|v| is_newer(&**v, stored)) {
                    view.changed(stored, change);
                }
            }
            UserEventKind::Removed(_) => {
                self.users.remove(&key);
            }
        }
    }

    fn apply_organization(&mut self, stored: &StoredEvent, event: OrganizationEvent) {
        let key = key(stored);
        match event.kind {
            OrganizationEventKind::Added(added) => {
                if !self
                    .organizations
                    .get(&key)
                    .is_some_and(|v| !is_newer(v, stored))
                {
                    self.organizations
                        .insert(key, OrganizationView::added(stored, added));
                }
            }
            OrganizationEventKind::Changed(change) => {
                if let Some(view) = self
                    .organizations
                    .get_mut(&key)
                    .filter(|v| is_newer(&**v, stored))
                {
                    view.changed(stored, change);
                }
            }
            OrganizationEventKind::Removed(_) => {
                self.organizations.remove(&key);
            }
        }
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Infrastructure("projection store lock poisoned".into())
}

/// Thread-safe holder of the [`ProjectionState`].
#[derive(Debug)]
pub struct ProjectionStore {
    state: RwLock<ProjectionState>,
}

impl Default for ProjectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionStore {
    /// Creates an empty store that is current as of now.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Creates an empty store that is current as of `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            state: RwLock::new(ProjectionState {
                targets: BTreeMap::new(),
                users: BTreeMap::new(),
                organizations: BTreeMap::new(),
                processed_position: 0,
                current_as_of: now,
            }),
        }
    }

    /// Runs `f` against a consistent view of the state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn read<T>(&self, f: impl FnOnce(&ProjectionState) -> T) -> Result<T, DomainError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(f(&state))
    }

    /// Position of the last event consumed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn processed_position(&self) -> Result<i64, DomainError> {
        self.read(|state| state.processed_position)
    }

    /// Folds `events` (in global order) into the views and advances the
    /// position. Events whose payload cannot be decoded are logged and
    /// skipped so one bad event cannot stall the read model.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub(crate) fn apply_batch(
        &self,
        events: &[StoredEvent],
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().map_err(poisoned)?;
        for stored in events {
            if stored.position <= state.processed_position {
                continue;
            }
            if let Err(err) = state.apply(stored) {
                error!(
                    position = stored.position,
                    event_type = %stored.event_type,
                    error = %err,
                    "skipping undecodable event"
                );
            }
            state.processed_position = stored.position;
        }
        state.current_as_of = now;
        Ok(())
    }
}
