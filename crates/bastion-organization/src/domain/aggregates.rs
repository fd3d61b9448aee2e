//! Write model for the organization aggregate.

use bastion_core::aggregate::{AggregateRef, AggregateRoot, LifecycleState, WriteModelRoot};
use bastion_core::clock::Clock;
use bastion_core::command::CommandContext;

use super::events::{
    ORGANIZATION_AGGREGATE_TYPE, OrganizationAdded, OrganizationChanged, OrganizationEvent,
    OrganizationEventKind, OrganizationRemoved,
};

/// Current state of one organization.
#[derive(Debug, Clone)]
pub struct OrganizationWriteModel {
    root: WriteModelRoot,
    pub name: String,
    uncommitted_events: Vec<OrganizationEvent>,
}

impl OrganizationWriteModel {
    /// Creates an empty write model. The organization owns itself.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            root: WriteModelRoot::new(AggregateRef::new(
                ORGANIZATION_AGGREGATE_TYPE,
                id.clone(),
                id,
            )),
            name: String::new(),
            uncommitted_events: Vec::new(),
        }
    }

    fn record(&mut self, kind: OrganizationEventKind, ctx: &CommandContext, clock: &dyn Clock) {
        let metadata =
            self.root
                .event_metadata(kind.event_type(), self.uncommitted_events.len(), ctx, clock);
        self.uncommitted_events
            .push(OrganizationEvent { metadata, kind });
    }

    pub fn add(&mut self, name: &str, ctx: &CommandContext, clock: &dyn Clock) {
        let added = OrganizationAdded {
            name: name.trim().to_owned(),
        };
        self.record(OrganizationEventKind::Added(added), ctx, clock);
    }

    /// Records a rename unless `name` is absent or equal to the current one.
    pub fn change(&mut self, name: Option<&str>, ctx: &CommandContext, clock: &dyn Clock) -> bool {
        let Some(name) = name.map(str::trim).filter(|n| *n != self.name) else {
            return false;
        };
        let changed = OrganizationChanged {
            name: name.to_owned(),
        };
        self.record(OrganizationEventKind::Changed(changed), ctx, clock);
        true
    }

    pub fn remove(&mut self, ctx: &CommandContext, clock: &dyn Clock) {
        let removed = OrganizationRemoved {
            name: self.name.clone(),
        };
        self.record(OrganizationEventKind::Removed(removed), ctx, clock);
    }
}

impl AggregateRoot for OrganizationWriteModel {
    type Event = OrganizationEvent;

    fn root(&self) -> &WriteModelRoot {
        &self.root
    }

    fn root_mut(&mut self) -> &mut WriteModelRoot {
        &mut self.root
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            OrganizationEventKind::Added(OrganizationAdded { name }) => {
                self.name.clone_from(name);
                self.root.state = LifecycleState::Active;
            }
            OrganizationEventKind::Changed(OrganizationChanged { name }) => {
                self.name.clone_from(name);
            }
            OrganizationEventKind::Removed(_) => self.root.state = LifecycleState::Removed,
        }
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
