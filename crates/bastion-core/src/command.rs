//! Command abstractions.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::DomainError;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Pure input validation, run before any store access.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` naming the offending field.
    fn validate(&self) -> Result<(), DomainError>;
}

/// Per-request context: who is acting, how to correlate the effects, and
/// until when the caller is willing to wait.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Correlation ID to trace this command through the system.
    pub correlation_id: Uuid,
    /// The acting principal, recorded on every event.
    pub actor: String,
    /// Caller-supplied deadline. `None` waits indefinitely.
    pub deadline: Option<Instant>,
}

impl CommandContext {
    /// Creates a context for `actor` with a fresh correlation id and no
    /// deadline.
    #[must_use]
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            actor: actor.into(),
            deadline: None,
        }
    }

    /// Uses the given correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Sets the deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails if the deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DeadlineExceeded` once the deadline has passed.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_expired() {
            return Err(DomainError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `fut`, aborting it when the deadline passes.
    ///
    /// Only use this for side-effect free operations such as reads; an
    /// aborted write may or may not have been applied.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DeadlineExceeded` if the deadline passes first,
    /// or the error produced by `fut`.
    pub async fn within_deadline<T, F>(&self, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| DomainError::DeadlineExceeded)?,
            None => fut.await,
        }
    }
}

/// Rejects empty or whitespace-only values.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` naming `field`.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_argument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Rejects a missing resource owner.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` if `resource_owner` is empty.
pub fn require_resource_owner(resource_owner: &str) -> Result<(), DomainError> {
    require_non_empty("resource owner", resource_owner)
}
