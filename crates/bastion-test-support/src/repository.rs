//! Test repositories: mock `EventRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bastion_core::aggregate::AggregateRef;
use bastion_core::error::DomainError;
use bastion_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

use crate::clock::fixed_now;

#[allow(clippy::cast_possible_wrap)]
fn advanced(expected_version: i64, events: &[StoredEvent]) -> i64 {
    expected_version + events.len() as i64
}

/// Builds a `StoredEvent` for `aggregate` with sensible defaults.
#[must_use]
pub fn stored_event(
    aggregate: &AggregateRef,
    sequence_number: i64,
    event_type: &str,
    payload: serde_json::Value,
) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        aggregate_type: aggregate.aggregate_type.to_owned(),
        aggregate_id: aggregate.aggregate_id.clone(),
        resource_owner: aggregate.resource_owner.clone(),
        event_type: event_type.to_owned(),
        payload,
        sequence_number,
        position: sequence_number,
        actor: "test-actor".to_owned(),
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        occurred_at: fixed_now(),
    }
}

/// An event repository that records all `append_events` calls. Returns the
/// configured events from every `load_events` call and always succeeds on
/// `append_events`.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEvent>>,
    load_calls: Mutex<usize>,
    appended: Mutex<Vec<(AggregateRef, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result: Mutex::new(load_result),
            load_calls: Mutex::new(0),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all events that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(AggregateRef, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns how many times `load_events` was called.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn load_calls(&self) -> usize {
        *self.load_calls.lock().unwrap()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        *self.load_calls.lock().unwrap() += 1;
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate.clone(), expected_version, events.to_vec()));
        Ok(advanced(expected_version, events))
    }

    async fn load_events_after(
        &self,
        position: i64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .load_result
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.position > position)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        Ok(advanced(expected_version, events))
    }

    async fn load_events_after(
        &self,
        _position: i64,
        _limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate: &AggregateRef,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_events_after(
        &self,
        _position: i64,
        _limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An event repository that returns the configured history but rejects every
/// append as if another writer got there first.
#[derive(Debug)]
pub struct ConflictingEventRepository {
    load_result: Vec<StoredEvent>,
}

impl ConflictingEventRepository {
    /// Create a repository whose loads return `load_result`.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self { load_result }
    }
}

#[async_trait]
impl EventRepository for ConflictingEventRepository {
    async fn load_events(&self, _aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.clone())
    }

    async fn append_events(
        &self,
        aggregate: &AggregateRef,
        expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id: aggregate.aggregate_id.clone(),
            expected: expected_version,
            actual: expected_version + 1,
        })
    }

    async fn load_events_after(
        &self,
        _position: i64,
        _limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }
}
