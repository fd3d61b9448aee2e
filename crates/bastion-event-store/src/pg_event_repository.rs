//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use bastion_core::aggregate::AggregateRef;
use bastion_core::error::DomainError;
use bastion_core::repository::{EventRepository, StoredEvent, validate_append_batch};

const SELECT_COLUMNS: &str = "position, event_id, aggregate_type, aggregate_id, resource_owner, \
     sequence_number, event_type, payload, actor, correlation_id, causation_id, occurred_at";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    position: i64,
    event_id: Uuid,
    aggregate_type: String,
    aggregate_id: String,
    resource_owner: String,
    sequence_number: i64,
    event_type: String,
    payload: serde_json::Value,
    actor: String,
    correlation_id: Uuid,
    causation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_type: row.aggregate_type,
            aggregate_id: row.aggregate_id,
            resource_owner: row.resource_owner,
            event_type: row.event_type,
            payload: row.payload,
            sequence_number: row.sequence_number,
            position: row.position,
            actor: row.actor,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            occurred_at: row.occurred_at,
        }
    }
}

/// Events one transaction may append. The low 16 bits of `position` hold
/// the event's index within its transaction.
const MAX_EVENTS_PER_TRANSACTION: usize = 1 << 16;

// `position` is the writer's transaction id shifted left 16 bits plus the
// number of events that transaction already wrote. Every transaction that can
// still commit has an id at or above the current snapshot's xmin, so rows
// below it are final and a cursor over them never skips a late commit.
const INSERT_EVENT: &str = "INSERT INTO events (position, event_id, aggregate_type, aggregate_id, \
     resource_owner, sequence_number, event_type, payload, actor, correlation_id, causation_id, \
     occurred_at) \
     VALUES ((pg_current_xact_id()::text::bigint << 16) \
     + (SELECT count(*) FROM events WHERE transaction_id = pg_current_xact_id()), \
     $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("event store: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version<'e, E>(executor: E, aggregate: &AggregateRef) -> Result<i64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM events \
             WHERE aggregate_type = $1 AND aggregate_id = $2 AND resource_owner = $3",
        )
        .bind(aggregate.aggregate_type)
        .bind(&aggregate.aggregate_id)
        .bind(&aggregate.resource_owner)
        .fetch_one(executor)
        .await
    }

    async fn conflict(&self, aggregate: &AggregateRef, expected: i64) -> DomainError {
        let actual = match Self::current_version(&self.pool, aggregate).await {
            Ok(actual) => actual,
            Err(err) => return infrastructure(&err),
        };
        warn!(%aggregate, expected, actual, "append rejected by concurrent writer");
        DomainError::ConcurrencyConflict {
            aggregate_id: aggregate.aggregate_id.clone(),
            expected,
            actual,
        }
    }

    /// Appends `events` inside the caller's transaction. Nothing becomes
    /// visible to readers until `tx` commits.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream is not at
    /// `expected_version`, `DomainError::InvalidArgument` for a malformed
    /// batch, or `DomainError::Infrastructure` on database failure.
    pub async fn append_events_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        validate_append_batch(aggregate, expected_version, events)?;
        if events.len() > MAX_EVENTS_PER_TRANSACTION {
            return Err(DomainError::invalid_argument(format!(
                "at most {MAX_EVENTS_PER_TRANSACTION} events may be appended at once"
            )));
        }

        let actual = Self::current_version(&mut **tx, aggregate)
            .await
            .map_err(|e| infrastructure(&e))?;
        if actual != expected_version {
            warn!(expected_version, actual, "stale expected version");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: aggregate.aggregate_id.clone(),
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(INSERT_EVENT)
                .bind(event.event_id)
                .bind(&event.aggregate_type)
                .bind(&event.aggregate_id)
                .bind(&event.resource_owner)
                .bind(event.sequence_number)
                .bind(&event.event_type)
                .bind(&event.payload)
                .bind(&event.actor)
                .bind(event.correlation_id)
                .bind(event.causation_id)
                .bind(event.occurred_at)
                .execute(&mut **tx)
                .await;

            if let Err(err) = inserted {
                // A concurrent writer committed the same sequence number
                // between our version check and insert.
                if is_unique_violation(&err) {
                    return Err(self.conflict(aggregate, expected_version).await);
                }
                return Err(infrastructure(&err));
            }
        }

        #[allow(clippy::cast_possible_wrap)]
        Ok(expected_version + events.len() as i64)
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self), fields(aggregate = %aggregate))]
    async fn load_events(&self, aggregate: &AggregateRef) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM events \
             WHERE aggregate_type = $1 AND aggregate_id = $2 AND resource_owner = $3 \
             ORDER BY sequence_number"
        ))
        .bind(aggregate.aggregate_type)
        .bind(&aggregate.aggregate_id)
        .bind(&aggregate.resource_owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    #[instrument(skip(self, events), fields(aggregate = %aggregate, count = events.len()))]
    async fn append_events(
        &self,
        aggregate: &AggregateRef,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;
        let new_version = self
            .append_events_in(&mut tx, aggregate, expected_version, events)
            .await?;
        tx.commit().await.map_err(|e| infrastructure(&e))?;

        debug!(new_version, "events appended");
        Ok(new_version)
    }

    #[instrument(skip(self))]
    async fn load_events_after(
        &self,
        position: i64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM events \
             WHERE position > $1 \
             AND transaction_id < pg_snapshot_xmin(pg_current_snapshot()) \
             ORDER BY position LIMIT $2"
        ))
        .bind(position)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }
}
