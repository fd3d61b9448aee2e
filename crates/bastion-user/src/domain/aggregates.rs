//! Write model for the user aggregate.

use bastion_core::aggregate::{AggregateRef, AggregateRoot, LifecycleState, WriteModelRoot};
use bastion_core::clock::Clock;
use bastion_core::command::CommandContext;

use super::commands::{AddHumanUser, ChangeHumanUser};
use super::events::{
    HumanUserAdded, HumanUserChanged, USER_AGGREGATE_TYPE, UserEvent, UserEventKind, UserRemoved,
};

/// Current state of one human user, folded from its events.
#[derive(Debug, Clone)]
pub struct HumanUserWriteModel {
    root: WriteModelRoot,
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub display_name: String,
    pub preferred_language: String,
    uncommitted_events: Vec<UserEvent>,
}

/// The trimmed request value when it differs from `current`.
fn changed(requested: Option<&String>, current: &str) -> Option<String> {
    requested
        .map(|value| value.trim())
        .filter(|value| *value != current)
        .map(str::to_owned)
}

impl HumanUserWriteModel {
    /// Creates an empty write model for the given user.
    #[must_use]
    pub fn new(id: impl Into<String>, resource_owner: impl Into<String>) -> Self {
        Self {
            root: WriteModelRoot::new(AggregateRef::new(USER_AGGREGATE_TYPE, id, resource_owner)),
            username: String::new(),
            email: String::new(),
            given_name: String::new(),
            family_name: String::new(),
            display_name: String::new(),
            preferred_language: String::new(),
            uncommitted_events: Vec::new(),
        }
    }

    fn record(&mut self, kind: UserEventKind, ctx: &CommandContext, clock: &dyn Clock) {
        let metadata =
            self.root
                .event_metadata(kind.event_type(), self.uncommitted_events.len(), ctx, clock);
        self.uncommitted_events.push(UserEvent { metadata, kind });
    }

    /// Records a `HumanUserAdded` event with defaults resolved.
    pub fn add(&mut self, command: &AddHumanUser, ctx: &CommandContext, clock: &dyn Clock) {
        let added = HumanUserAdded {
            username: command.username.trim().to_owned(),
            email: command.email.trim().to_owned(),
            given_name: command.given_name.trim().to_owned(),
            family_name: command.family_name.trim().to_owned(),
            display_name: command.resolved_display_name(),
            preferred_language: command.resolved_language(),
        };
        self.record(UserEventKind::Added(added), ctx, clock);
    }

    /// Records a `HumanUserChanged` event with the fields that differ.
    /// Returns `false` when nothing differs.
    pub fn change(
        &mut self,
        command: &ChangeHumanUser,
        ctx: &CommandContext,
        clock: &dyn Clock,
    ) -> bool {
        let diff = HumanUserChanged {
            username: changed(command.username.as_ref(), &self.username),
            email: changed(command.email.as_ref(), &self.email),
            given_name: changed(command.given_name.as_ref(), &self.given_name),
            family_name: changed(command.family_name.as_ref(), &self.family_name),
            display_name: changed(command.display_name.as_ref(), &self.display_name),
            preferred_language: changed(
                command.preferred_language.as_ref(),
                &self.preferred_language,
            ),
        };
        if diff.is_empty() {
            return false;
        }
        self.record(UserEventKind::Changed(diff), ctx, clock);
        true
    }

    /// Records a terminal `UserRemoved` event.
    pub fn remove(&mut self, ctx: &CommandContext, clock: &dyn Clock) {
        let removed = UserRemoved {
            username: self.username.clone(),
        };
        self.record(UserEventKind::Removed(removed), ctx, clock);
    }
}

impl AggregateRoot for HumanUserWriteModel {
    type Event = UserEvent;

    fn root(&self) -> &WriteModelRoot {
        &self.root
    }

    fn root_mut(&mut self) -> &mut WriteModelRoot {
        &mut self.root
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            UserEventKind::Added(added) => {
                self.username.clone_from(&added.username);
                self.email.clone_from(&added.email);
                self.given_name.clone_from(&added.given_name);
                self.family_name.clone_from(&added.family_name);
                self.display_name.clone_from(&added.display_name);
                self.preferred_language.clone_from(&added.preferred_language);
                self.root.state = LifecycleState::Active;
            }
            UserEventKind::Changed(change) => {
                let fields = [
                    (&change.username, &mut self.username),
                    (&change.email, &mut self.email),
                    (&change.given_name, &mut self.given_name),
                    (&change.family_name, &mut self.family_name),
                    (&change.display_name, &mut self.display_name),
                    (&change.preferred_language, &mut self.preferred_language),
                ];
                for (update, field) in fields {
                    if let Some(value) = update {
                        field.clone_from(value);
                    }
                }
            }
            UserEventKind::Removed(_) => self.root.state = LifecycleState::Removed,
        }
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
