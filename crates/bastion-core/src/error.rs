//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request itself is malformed; detected before any store access.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The aggregate does not exist or has been removed.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        /// The aggregate type that was looked up.
        aggregate_type: &'static str,
        /// The requested aggregate id.
        id: String,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// The caller's deadline expired before the operation could complete.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for an `InvalidArgument` naming the offending field.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for a `NotFound` on the given aggregate.
    #[must_use]
    pub fn not_found(aggregate_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            aggregate_type,
            id: id.into(),
        }
    }
}
