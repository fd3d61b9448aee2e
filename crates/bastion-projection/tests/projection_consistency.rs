//! Read-after-write behaviour of the projection against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use bastion_core::clock::SystemClock;
use bastion_core::command::CommandContext;
use bastion_core::error::DomainError;
use bastion_core::eventually::{PollPolicy, await_until};
use bastion_core::repository::EventRepository;
use bastion_event_store::InMemoryEventRepository;
use bastion_projection::query::{
    TargetSearchQuery, TargetSearchRequest, TextQuery, UserSearchQuery, UserSearchRequest,
};
use bastion_projection::query_handlers::{
    get_target_by_id, get_user_by_id, list_targets, list_users,
};
use bastion_projection::{ProjectionStore, Projector, ProjectorConfig};
use bastion_target::application::command_handlers::{
    handle_add_target, handle_change_target, handle_delete_target,
};
use bastion_target::domain::commands::{AddTarget, ChangeTarget, DeleteTarget};
use bastion_target::domain::events::TargetType;
use bastion_test_support::{FixedClock, SequenceIdGenerator, fixed_now};
use bastion_user::application::command_handlers::handle_add_human_user;
use bastion_user::domain::commands::AddHumanUser;
use tokio_util::sync::CancellationToken;

fn add_target(name: &str) -> AddTarget {
    AddTarget {
        aggregate_id: None,
        name: name.to_owned(),
        target_type: TargetType::Webhook,
        url: "https://example.com/hook".to_owned(),
        timeout: Duration::from_secs(5),
        is_async: false,
        interrupt_on_error: true,
    }
}

fn by_name(name: &str) -> TargetSearchRequest {
    TargetSearchRequest {
        queries: vec![TargetSearchQuery::Name(TextQuery {
            value: name.to_owned(),
            method: Default::default(),
        })],
        ..TargetSearchRequest::default()
    }
}

struct Fixture {
    repo: Arc<InMemoryEventRepository>,
    store: Arc<ProjectionStore>,
    projector: Projector,
}

fn fixture(config: ProjectorConfig) -> Fixture {
    let repo = Arc::new(InMemoryEventRepository::new());
    let store = Arc::new(ProjectionStore::new());
    let projector = Projector::new(
        repo.clone() as Arc<dyn EventRepository>,
        store.clone(),
        Arc::new(SystemClock),
        config,
    );
    Fixture {
        repo,
        store,
        projector,
    }
}

#[tokio::test]
async fn test_writes_become_visible_only_after_projection() {
    // Arrange
    let f = fixture(ProjectorConfig::default());
    let ctx = CommandContext::new("tester");
    let clock = FixedClock(fixed_now());
    let ids = SequenceIdGenerator::new(["t-1"]);

    // Act
    handle_add_target(&ctx, &add_target("T1"), "org-1", &clock, &ids, f.repo.as_ref())
        .await
        .unwrap();
    let before = get_target_by_id(&f.store, "org-1", "t-1");
    f.projector.catch_up().await.unwrap();
    let after = get_target_by_id(&f.store, "org-1", "t-1").unwrap();

    // Assert
    assert!(matches!(before, Err(DomainError::NotFound { .. })));
    assert_eq!(after.name, "T1");
    assert_eq!(after.details.sequence, 1);
    assert_eq!(after.details.creation_date, fixed_now());
    assert!(after.interrupt_on_error);
}

#[tokio::test]
async fn test_full_lifecycle_is_reflected_in_views() {
    // Arrange
    let f = fixture(ProjectorConfig::default());
    let ctx = CommandContext::new("tester");
    let clock = FixedClock(fixed_now());
    let ids = SequenceIdGenerator::new(["t-1"]);
    handle_add_target(&ctx, &add_target("T1"), "org-1", &clock, &ids, f.repo.as_ref())
        .await
        .unwrap();
    let rename = ChangeTarget {
        aggregate_id: "t-1".to_owned(),
        name: Some("T2".to_owned()),
        ..ChangeTarget::default()
    };
    handle_change_target(&ctx, &rename, "org-1", &clock, f.repo.as_ref())
        .await
        .unwrap();

    // Act
    f.projector.catch_up().await.unwrap();
    let renamed = list_targets(&f.store, "org-1", &by_name("T2")).unwrap();
    let delete = DeleteTarget {
        aggregate_id: "t-1".to_owned(),
    };
    handle_delete_target(&ctx, &delete, "org-1", &clock, f.repo.as_ref())
        .await
        .unwrap();
    f.projector.catch_up().await.unwrap();
    let gone = get_target_by_id(&f.store, "org-1", "t-1");

    // Assert
    assert_eq!(renamed.details.total_count, 1);
    assert_eq!(renamed.results[0].details.sequence, 2);
    assert_eq!(renamed.details.processed_position, 2);
    assert!(matches!(gone, Err(DomainError::NotFound { .. })));
    assert_eq!(f.store.processed_position().unwrap(), 3);
}

#[tokio::test]
async fn test_catch_up_drains_log_in_small_batches() {
    let f = fixture(ProjectorConfig {
        batch_size: 2,
        ..ProjectorConfig::default()
    });
    let ctx = CommandContext::new("tester");
    let clock = FixedClock(fixed_now());
    let ids = SequenceIdGenerator::new(["t-1", "t-2", "t-3", "t-4", "t-5"]);
    for n in 1..=5 {
        handle_add_target(&ctx, &add_target(&format!("T{n}")), "org-1", &clock, &ids, f.repo.as_ref())
            .await
            .unwrap();
    }

    let fetched = f.projector.catch_up().await.unwrap();

    assert_eq!(fetched, 5);
    let all = list_targets(&f.store, "org-1", &TargetSearchRequest::default()).unwrap();
    assert_eq!(all.details.total_count, 5);
}

#[tokio::test]
async fn test_spawned_projector_with_delay_is_awaited() {
    // Arrange
    let f = fixture(ProjectorConfig {
        poll_interval: Duration::from_millis(10),
        delay: Duration::from_millis(200),
        ..ProjectorConfig::default()
    });
    let store = f.store.clone();
    let handle = f.projector.spawn(CancellationToken::new());
    let ctx = CommandContext::new("tester");
    let clock = FixedClock(fixed_now());
    let ids = SequenceIdGenerator::new(["u-1"]);
    let command = AddHumanUser {
        aggregate_id: None,
        username: "ada".to_owned(),
        email: "ada@example.com".to_owned(),
        given_name: "Ada".to_owned(),
        family_name: "Lovelace".to_owned(),
        display_name: None,
        preferred_language: None,
    };

    // Act
    handle_add_human_user(&ctx, &command, "org-1", &clock, &ids, f.repo.as_ref())
        .await
        .unwrap();
    let by_id = UserSearchRequest {
        queries: vec![UserSearchQuery::InUserIds(vec!["u-1".to_owned()])],
        ..UserSearchRequest::default()
    };
    let immediately = list_users(&store, Some("org-1"), &by_id).unwrap();
    let eventually = await_until(
        PollPolicy::fixed(Duration::from_secs(5), Duration::from_millis(20)),
        || {
            let store = store.clone();
            let by_id = by_id.clone();
            async move {
                let response = list_users(&store, Some("org-1"), &by_id)?;
                if response.details.total_count == 1 {
                    Ok(response)
                } else {
                    Err(DomainError::not_found("user", "u-1"))
                }
            }
        },
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(immediately.details.total_count, 0);
    assert_eq!(eventually.results.len(), 1);
    assert_eq!(eventually.results[0].display_name, "Ada Lovelace");
    assert_eq!(eventually.results[0].preferred_language, "und");
    let user = get_user_by_id(&store, "org-1", "u-1").unwrap();
    assert_eq!(user.details.sequence, 1);
    handle.join().await;
}

#[tokio::test]
async fn test_await_until_reports_timeout_when_nothing_projects() {
    let store = Arc::new(ProjectionStore::new());

    let result = await_until(
        PollPolicy::fixed(Duration::from_millis(50), Duration::from_millis(10)),
        || {
            let store = store.clone();
            async move { get_target_by_id(&store, "org-1", "missing") }
        },
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.attempts >= 1);
    assert!(matches!(err.last_error, Some(DomainError::NotFound { .. })));
}
