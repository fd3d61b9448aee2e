//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use bastion_core::repository::EventRepository;
use bastion_event_store::{InMemoryEventRepository, PgEventRepository};
use bastion_projection::{ProjectionStore, Projector, ProjectorConfig};
use bastion_test_support::{FixedClock, SequenceIdGenerator, fixed_now};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use bastion_api::context::RESOURCE_OWNER_HEADER;
use bastion_api::routes;
use bastion_api::state::AppState;

/// The router plus a projector the test drives by hand, so read-after-write
/// is deterministic.
pub struct TestApp {
    pub router: Router,
    pub projector: Projector,
}

impl TestApp {
    /// Folds every stored event into the read model.
    pub async fn project(&self) {
        self.projector.catch_up().await.unwrap();
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        resource_owner: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = resource_owner {
            builder = builder.header(RESOURCE_OWNER_HEADER, owner);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };

        (status, json)
    }
}

/// Build the full app router over `event_repository` with a fixed clock and
/// the given ids handed out in order. Uses the same route structure as
/// `main.rs`.
pub fn build_test_app_with(
    event_repository: Arc<dyn EventRepository>,
    ids: &[&str],
) -> TestApp {
    let projection = Arc::new(ProjectionStore::new());
    let clock = Arc::new(FixedClock(fixed_now()));
    let projector = Projector::new(
        event_repository.clone(),
        projection.clone(),
        clock.clone(),
        ProjectorConfig::default(),
    );
    let app_state = AppState::new(
        event_repository,
        projection,
        clock,
        Arc::new(SequenceIdGenerator::new(ids.iter().copied())),
        Duration::from_secs(5),
    );

    TestApp {
        router: routes::router(app_state),
        projector,
    }
}

/// App over a fresh in-memory event store.
pub fn build_test_app(ids: &[&str]) -> TestApp {
    build_test_app_with(Arc::new(InMemoryEventRepository::new()), ids)
}

/// App over a `PostgreSQL` event store.
pub fn build_pg_test_app(pool: PgPool, ids: &[&str]) -> TestApp {
    build_test_app_with(Arc::new(PgEventRepository::new(pool)), ids)
}
