//! In-memory implementation of the `EventRepository` trait.
//!
//! Each aggregate stream has its own lock, so appends to unrelated
//! aggregates never wait on each other's version checks. A short critical
//! section on the global log assigns positions in commit order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use bastion_core::aggregate::AggregateRef;
use bastion_core::error::DomainError;
use bastion_core::repository::{EventRepository, StoredEvent, validate_append_batch};

type StreamKey = (String, String, String);
type Stream = Arc<Mutex<Vec<StoredEvent>>>;

fn stream_key(aggregate: &AggregateRef) -> StreamKey {
    (
        aggregate.aggregate_type.to_owned(),
        aggregate.aggregate_id.clone(),
        aggregate.resource_owner.clone(),
    )
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Infrastructure("in-memory event store lock poisoned".into())
}

/// Event repository holding all streams in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<StreamKey, Stream>>,
    log: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all streams.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a lock is poisoned.
    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self.log.lock().map_err(poisoned)?.len())
    }

    /// Whether no event has been appended yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    fn stream(&self, aggregate: &AggregateRef) -> Result<Option<Stream>, DomainError> {
        let streams = self.streams.read().map_err(poisoned)?;
        Ok(streams.get(&stream_key(aggregate)).cloned())
    }

    fn stream_or_insert(&self, aggregate: &AggregateRef) -> Result<Stream, DomainError> {
        if let Some(stream) = self.stream(aggregate)? {
            return Ok(stream);
        }
        let mut streams = self.streams.write().map_err(poisoned)?;
        Ok(streams.entry(stream_key(aggregate)).or_default().clone())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        match self.stream(aggregate)? {
            Some(stream) => Ok(stream.lock().map_err(poisoned)?.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn append_events(
        &self,
        aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        if events.is_empty() {
            return Ok(expected_version);
        }
        validate_append_batch(aggregate, expected_version, events)?;

        let stream = self.stream_or_insert(aggregate)?;
        let mut stream = stream.lock().map_err(poisoned)?;

        let actual = stream.last().map_or(0, |e| e.sequence_number);
        if actual != expected_version {
            warn!(%aggregate, expected_version, actual, "append rejected by concurrent writer");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: aggregate.aggregate_id.clone(),
                expected: expected_version,
                actual,
            });
        }

        {
            let mut log = self.log.lock().map_err(poisoned)?;
            for event in events {
                let mut event = event.clone();
                #[allow(clippy::cast_possible_wrap)]
                let position = log.len() as i64 + 1;
                event.position = position;
                log.push(event.clone());
                stream.push(event);
            }
        }

        let new_version = stream.last().map_or(0, |e| e.sequence_number);
        debug!(%aggregate, new_version, "events appended");
        Ok(new_version)
    }

    async fn load_events_after(
        &self,
        position: i64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.log.lock().map_err(poisoned)?;
        // Positions are 1-based and dense, so they index the log directly.
        let start = usize::try_from(position.max(0)).unwrap_or(usize::MAX);
        Ok(log.iter().skip(start).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_test_support::stored_event;

    fn target(id: &str) -> AggregateRef {
        AggregateRef::new("target", id, "org-1")
    }

    fn event(aggregate: &AggregateRef, sequence_number: i64) -> StoredEvent {
        stored_event(
            aggregate,
            sequence_number,
            "target.added",
            serde_json::json!({ "key": "value" }),
        )
    }

    #[tokio::test]
    async fn test_load_events_returns_empty_vec_for_nonexistent_aggregate() {
        let repo = InMemoryEventRepository::new();

        let events = repo.load_events(&target("missing")).await.unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_append_assigns_dense_global_positions() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let a = target("a");
        let b = target("b");

        // Act
        repo.append_events(&a, 0, &[event(&a, 1), event(&a, 2)])
            .await
            .unwrap();
        let version = repo.append_events(&b, 0, &[event(&b, 1)]).await.unwrap();

        // Assert
        assert_eq!(version, 1);
        let all = repo.load_events_after(0, 10).await.unwrap();
        let positions: Vec<i64> = all.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        let tail = repo.load_events_after(2, 10).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].aggregate_id, "b");
    }

    #[tokio::test]
    async fn test_streams_are_scoped_by_resource_owner() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let mine = AggregateRef::new("target", "t-1", "org-1");
        let theirs = AggregateRef::new("target", "t-1", "org-2");

        // Act
        repo.append_events(&mine, 0, &[event(&mine, 1)]).await.unwrap();

        // Assert
        assert_eq!(repo.load_events(&mine).await.unwrap().len(), 1);
        assert!(repo.load_events(&theirs).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_a_conflict() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let a = target("a");
        repo.append_events(&a, 0, &[event(&a, 1), event(&a, 2)])
            .await
            .unwrap();

        // Act
        let result = repo.append_events(&a, 0, &[event(&a, 1)]).await;

        // Assert
        match result {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            }) => {
                assert_eq!(aggregate_id, "a");
                assert_eq!(expected, 0);
                assert_eq!(actual, 2);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        assert_eq!(repo.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_non_contiguous_batch_is_rejected_without_writing() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let a = target("a");

        // Act
        let result = repo.append_events(&a, 0, &[event(&a, 2)]).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert!(repo.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_append_empty_events_is_noop() {
        let repo = InMemoryEventRepository::new();
        let a = target("a");

        let version = repo.append_events(&a, 0, &[]).await.unwrap();

        assert_eq!(version, 0);
        assert!(repo.load_events(&a).await.unwrap().is_empty());
    }
}
