//! Human user lifecycle against the in-memory event store.

use bastion_core::aggregate::{AggregateRoot, LifecycleState};
use bastion_core::command::CommandContext;
use bastion_core::error::DomainError;
use bastion_core::write_model::load_write_model;
use bastion_event_store::InMemoryEventRepository;
use bastion_test_support::{FixedClock, SequenceIdGenerator, fixed_now};
use bastion_user::application::command_handlers::{
    handle_add_human_user, handle_change_human_user, handle_remove_user,
};
use bastion_user::domain::aggregates::HumanUserWriteModel;
use bastion_user::domain::commands::{AddHumanUser, ChangeHumanUser, RemoveUser};

#[tokio::test]
async fn test_user_add_change_remove() {
    let ctx = CommandContext::new("tester");
    let clock = FixedClock(fixed_now());
    let ids = SequenceIdGenerator::new(["u-1"]);
    let repo = InMemoryEventRepository::new();
    let add = AddHumanUser {
        aggregate_id: None,
        username: "grace".to_owned(),
        email: "grace@example.com".to_owned(),
        given_name: "Grace".to_owned(),
        family_name: "Hopper".to_owned(),
        display_name: Some("Amazing Grace".to_owned()),
        preferred_language: Some("en".to_owned()),
    };

    let added = handle_add_human_user(&ctx, &add, "org-1", &clock, &ids, &repo)
        .await
        .unwrap();
    assert_eq!(added.sequence, 1);

    let same_email = ChangeHumanUser {
        aggregate_id: "u-1".to_owned(),
        email: Some("grace@example.com".to_owned()),
        ..ChangeHumanUser::default()
    };
    let unchanged = handle_change_human_user(&ctx, &same_email, "org-1", &clock, &repo)
        .await
        .unwrap();
    assert_eq!(unchanged.sequence, 1);

    let new_name = ChangeHumanUser {
        aggregate_id: "u-1".to_owned(),
        family_name: Some("Murray Hopper".to_owned()),
        ..ChangeHumanUser::default()
    };
    let changed = handle_change_human_user(&ctx, &new_name, "org-1", &clock, &repo)
        .await
        .unwrap();
    assert_eq!(changed.sequence, 2);

    let remove = RemoveUser {
        aggregate_id: "u-1".to_owned(),
    };
    let removed = handle_remove_user(&ctx, &remove, "org-1", &clock, &repo)
        .await
        .unwrap();
    assert_eq!(removed.sequence, 3);

    let model = load_write_model(&ctx, &repo, HumanUserWriteModel::new("u-1", "org-1"))
        .await
        .unwrap();
    assert_eq!(model.state(), LifecycleState::Removed);
    assert_eq!(model.family_name, "Murray Hopper");
    assert_eq!(model.display_name, "Amazing Grace");

    let after = handle_change_human_user(&ctx, &new_name, "org-1", &clock, &repo).await;
    assert!(matches!(after, Err(DomainError::NotFound { .. })));
}
