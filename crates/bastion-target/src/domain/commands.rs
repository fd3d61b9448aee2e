//! Commands for the Target aggregate.

use std::time::Duration;

use bastion_core::command::{Command, require_non_empty};
use bastion_core::error::DomainError;

use super::events::TargetType;

fn require_timeout(timeout: Duration) -> Result<(), DomainError> {
    if timeout.is_zero() {
        return Err(DomainError::invalid_argument(
            "timeout must be greater than zero",
        ));
    }
    Ok(())
}

fn require_url(url: &str) -> Result<(), DomainError> {
    require_non_empty("url", url)?;
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| DomainError::invalid_argument(format!("url is not a valid URL: {e}")))
}

/// Command to create a target.
#[derive(Debug, Clone)]
pub struct AddTarget {
    /// Explicit id. Generated when absent or blank.
    pub aggregate_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Call style.
    pub target_type: TargetType,
    /// Absolute endpoint URL.
    pub url: String,
    /// Call timeout. Must be non-zero.
    pub timeout: Duration,
    /// Whether the call runs asynchronously.
    pub is_async: bool,
    /// Whether a failing call interrupts the calling flow.
    pub interrupt_on_error: bool,
}

impl AddTarget {
    /// The caller-supplied id, if it is usable.
    #[must_use]
    pub fn requested_id(&self) -> Option<&str> {
        self.aggregate_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

impl Command for AddTarget {
    fn command_type(&self) -> &'static str {
        "target.add"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("name", &self.name)?;
        require_timeout(self.timeout)?;
        require_url(&self.url)
    }
}

/// Command to change a target. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChangeTarget {
    /// The target to change.
    pub aggregate_id: String,
    /// New display name. Must not be blank.
    pub name: Option<String>,
    /// New call style.
    pub target_type: Option<TargetType>,
    /// New endpoint URL. Must parse as an absolute URL.
    pub url: Option<String>,
    /// New call timeout. Must be non-zero.
    pub timeout: Option<Duration>,
    /// Whether the call runs asynchronously.
    pub is_async: Option<bool>,
    /// Whether a failing call interrupts the calling flow.
    pub interrupt_on_error: Option<bool>,
}

impl Command for ChangeTarget {
    fn command_type(&self) -> &'static str {
        "target.change"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("target id", &self.aggregate_id)?;
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(timeout) = self.timeout {
            require_timeout(timeout)?;
        }
        if let Some(url) = &self.url {
            require_url(url)?;
        }
        Ok(())
    }
}

/// Command to delete a target.
#[derive(Debug, Clone)]
pub struct DeleteTarget {
    /// The target to delete.
    pub aggregate_id: String,
}

impl Command for DeleteTarget {
    fn command_type(&self) -> &'static str {
        "target.delete"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("target id", &self.aggregate_id)
    }
}
