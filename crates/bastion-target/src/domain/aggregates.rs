//! Write model for the Target aggregate.

use std::time::Duration;

use bastion_core::aggregate::{AggregateRef, AggregateRoot, LifecycleState, WriteModelRoot};
use bastion_core::clock::Clock;
use bastion_core::command::CommandContext;

use super::commands::{AddTarget, ChangeTarget};
use super::events::{
    TARGET_AGGREGATE_TYPE, TargetAdded, TargetChanged, TargetEvent, TargetEventKind,
    TargetRemoved, TargetType,
};

/// Current state of one target, folded from its events.
#[derive(Debug, Clone)]
pub struct TargetWriteModel {
    root: WriteModelRoot,
    pub name: String,
    pub target_type: TargetType,
    pub url: String,
    pub timeout: Duration,
    pub is_async: bool,
    pub interrupt_on_error: bool,
    uncommitted_events: Vec<TargetEvent>,
}

/// Keeps `requested` only if it differs from `current`.
fn changed<T: PartialEq + Clone>(requested: Option<&T>, current: &T) -> Option<T> {
    requested.filter(|value| *value != current).cloned()
}

impl TargetWriteModel {
    /// Creates an empty write model for the given target.
    #[must_use]
    pub fn new(id: impl Into<String>, resource_owner: impl Into<String>) -> Self {
        Self {
            root: WriteModelRoot::new(AggregateRef::new(
                TARGET_AGGREGATE_TYPE,
                id,
                resource_owner,
            )),
            name: String::new(),
            target_type: TargetType::Webhook,
            url: String::new(),
            timeout: Duration::ZERO,
            is_async: false,
            interrupt_on_error: false,
            uncommitted_events: Vec::new(),
        }
    }

    fn record(&mut self, kind: TargetEventKind, ctx: &CommandContext, clock: &dyn Clock) {
        let metadata =
            self.root
                .event_metadata(kind.event_type(), self.uncommitted_events.len(), ctx, clock);
        self.uncommitted_events.push(TargetEvent { metadata, kind });
    }

    /// Records a `TargetAdded` event carrying every field.
    pub fn add(&mut self, command: &AddTarget, ctx: &CommandContext, clock: &dyn Clock) {
        let added = TargetAdded {
            name: command.name.clone(),
            target_type: command.target_type,
            url: command.url.clone(),
            timeout: command.timeout,
            is_async: command.is_async,
            interrupt_on_error: command.interrupt_on_error,
        };
        self.record(TargetEventKind::Added(added), ctx, clock);
    }

    /// Records a `TargetChanged` event with the fields that differ from the
    /// current state. Returns `false` without recording anything when no
    /// field differs.
    pub fn change(&mut self, command: &ChangeTarget, ctx: &CommandContext, clock: &dyn Clock) -> bool {
        let diff = TargetChanged {
            name: changed(command.name.as_ref(), &self.name),
            target_type: changed(command.target_type.as_ref(), &self.target_type),
            url: changed(command.url.as_ref(), &self.url),
            timeout: changed(command.timeout.as_ref(), &self.timeout),
            is_async: changed(command.is_async.as_ref(), &self.is_async),
            interrupt_on_error: changed(
                command.interrupt_on_error.as_ref(),
                &self.interrupt_on_error,
            ),
        };
        if diff.is_empty() {
            return false;
        }
        self.record(TargetEventKind::Changed(diff), ctx, clock);
        true
    }

    /// Records a terminal `TargetRemoved` event.
    pub fn remove(&mut self, ctx: &CommandContext, clock: &dyn Clock) {
        let removed = TargetRemoved {
            name: self.name.clone(),
        };
        self.record(TargetEventKind::Removed(removed), ctx, clock);
    }
}

impl AggregateRoot for TargetWriteModel {
    type Event = TargetEvent;

    fn root(&self) -> &WriteModelRoot {
        &self.root
    }

    fn root_mut(&mut self) -> &mut WriteModelRoot {
        &mut self.root
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            TargetEventKind::Added(added) => {
                self.name.clone_from(&added.name);
                self.target_type = added.target_type;
                self.url.clone_from(&added.url);
                self.timeout = added.timeout;
                self.is_async = added.is_async;
                self.interrupt_on_error = added.interrupt_on_error;
                self.root.state = LifecycleState::Active;
            }
            TargetEventKind::Changed(change) => {
                if let Some(name) = &change.name {
                    self.name.clone_from(name);
                }
                if let Some(target_type) = change.target_type {
                    self.target_type = target_type;
                }
                if let Some(url) = &change.url {
                    self.url.clone_from(url);
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
            }
            TargetEventKind::Removed(_) => self.root.state = LifecycleState::Removed,
        }
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::event::{DomainEvent, to_stored_event};
    use bastion_core::write_model::reduce;
    use bastion_test_support::{FixedClock, fixed_now};
    use crate::domain::events::{TARGET_ADDED_EVENT_TYPE, TARGET_CHANGED_EVENT_TYPE};

    fn add_command() -> AddTarget {
        AddTarget {
            aggregate_id: None,
            name: "T1".to_owned(),
            target_type: TargetType::Webhook,
            url: "https://example.com".to_owned(),
            timeout: Duration::from_secs(5),
            is_async: false,
            interrupt_on_error: false,
        }
    }

    /// Folds the pending events as if they had been pushed.
    fn commit(model: &mut TargetWriteModel) {
        let aggregate = model.aggregate_ref().clone();
        let stored: Vec<_> = model
            .uncommitted_events()
            .iter()
            .map(|e| to_stored_event(&aggregate, e))
            .collect();
        model.clear_uncommitted_events();
        reduce(model, &stored).unwrap();
    }

    fn active_target() -> TargetWriteModel {
        let mut model = TargetWriteModel::new("t-1", "org-1");
        model.add(
            &add_command(),
            &CommandContext::new("tester"),
            &FixedClock(fixed_now()),
        );
        commit(&mut model);
        model
    }

    #[test]
    fn test_add_produces_target_added_event() {
        // Arrange
        let ctx = CommandContext::new("tester");
        let clock = FixedClock(fixed_now());
        let mut model = TargetWriteModel::new("t-1", "org-1");

        // Act
        model.add(&add_command(), &ctx, &clock);

        // Assert
        let events = model.uncommitted_events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type(), TARGET_ADDED_EVENT_TYPE);
        let meta = event.metadata();
        assert_eq!(meta.aggregate_id, "t-1");
        assert_eq!(meta.resource_owner, "org-1");
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.actor, "tester");
        assert_eq!(meta.correlation_id, ctx.correlation_id);
        assert_eq!(meta.occurred_at, fixed_now());
        match &event.kind {
            TargetEventKind::Added(added) => {
                assert_eq!(added.name, "T1");
                assert_eq!(added.timeout, Duration::from_secs(5));
            }
            other => panic!("expected Added, got {other:?}"),
        }
    }

    #[test]
    fn test_reduced_add_marks_target_active() {
        let model = active_target();

        assert_eq!(model.state(), LifecycleState::Active);
        assert_eq!(model.version(), 1);
        assert_eq!(model.url, "https://example.com");
        assert_eq!(model.root().creation_date, Some(fixed_now()));
    }

    #[test]
    fn test_change_with_identical_fields_records_nothing() {
        // Arrange
        let mut model = active_target();
        let command = ChangeTarget {
            aggregate_id: "t-1".to_owned(),
            name: Some("T1".to_owned()),
            url: Some("https://example.com".to_owned()),
            timeout: Some(Duration::from_secs(5)),
            is_async: Some(false),
            ..ChangeTarget::default()
        };

        // Act
        let recorded = model.change(
            &command,
            &CommandContext::new("tester"),
            &FixedClock(fixed_now()),
        );

        // Assert
        assert!(!recorded);
        assert!(model.uncommitted_events().is_empty());
    }

    #[test]
    fn test_change_carries_only_differing_fields() {
        // Arrange
        let mut model = active_target();
        let command = ChangeTarget {
            aggregate_id: "t-1".to_owned(),
            name: Some("T1".to_owned()),
            timeout: Some(Duration::from_secs(10)),
            ..ChangeTarget::default()
        };

        // Act
        let recorded = model.change(
            &command,
            &CommandContext::new("tester"),
            &FixedClock(fixed_now()),
        );

        // Assert
        assert!(recorded);
        let event = &model.uncommitted_events()[0];
        assert_eq!(event.event_type(), TARGET_CHANGED_EVENT_TYPE);
        assert_eq!(event.metadata().sequence_number, 2);
        assert_eq!(
            event.kind,
            TargetEventKind::Changed(TargetChanged {
                timeout: Some(Duration::from_secs(10)),
                ..TargetChanged::default()
            })
        );
    }

    #[test]
    fn test_reduced_change_and_remove_update_state() {
        // Arrange
        let mut model = active_target();
        let ctx = CommandContext::new("tester");
        let clock = FixedClock(fixed_now());
        let command = ChangeTarget {
            aggregate_id: "t-1".to_owned(),
            target_type: Some(TargetType::RequestResponse),
            interrupt_on_error: Some(true),
            ..ChangeTarget::default()
        };

        // Act
        model.change(&command, &ctx, &clock);
        model.remove(&ctx, &clock);
        commit(&mut model);

        // Assert
        assert_eq!(model.version(), 3);
        assert_eq!(model.target_type, TargetType::RequestResponse);
        assert!(model.interrupt_on_error);
        assert_eq!(model.state(), LifecycleState::Removed);
    }
}
