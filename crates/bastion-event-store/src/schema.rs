//! Event store database schema.

/// SQL to create the events table.
///
/// Kept in sync with `migrations/0001_create_events.sql`.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    position        BIGINT PRIMARY KEY,
    transaction_id  XID8 NOT NULL DEFAULT pg_current_xact_id(),
    event_id        UUID NOT NULL UNIQUE,
    aggregate_type  VARCHAR(255) NOT NULL,
    aggregate_id    VARCHAR(255) NOT NULL,
    resource_owner  VARCHAR(255) NOT NULL,
    sequence_number BIGINT NOT NULL,
    event_type      VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL,
    actor           VARCHAR(255) NOT NULL,
    correlation_id  UUID NOT NULL,
    causation_id    UUID NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    UNIQUE (aggregate_type, aggregate_id, resource_owner, sequence_number)
);

CREATE INDEX IF NOT EXISTS idx_events_correlation_id
    ON events (correlation_id);

CREATE INDEX IF NOT EXISTS idx_events_transaction_id
    ON events (transaction_id);
";
