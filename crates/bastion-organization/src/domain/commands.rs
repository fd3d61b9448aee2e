//! Commands for the organization aggregate.

use bastion_core::command::{Command, require_non_empty};
use bastion_core::error::DomainError;

/// Command to create an organization.
#[derive(Debug, Clone)]
pub struct AddOrganization {
    /// Explicit id. Generated when absent or blank.
    pub aggregate_id: Option<String>,
    pub name: String,
}

impl AddOrganization {
    /// The caller-supplied id, if it is usable.
    #[must_use]
    pub fn requested_id(&self) -> Option<&str> {
        self.aggregate_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

impl Command for AddOrganization {
    fn command_type(&self) -> &'static str {
        "org.add"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("name", &self.name)
    }
}

/// Command to rename an organization.
#[derive(Debug, Clone)]
pub struct ChangeOrganization {
    pub aggregate_id: String,
    pub name: Option<String>,
}

impl Command for ChangeOrganization {
    fn command_type(&self) -> &'static str {
        "org.change"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("organization id", &self.aggregate_id)?;
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        Ok(())
    }
}

/// Command to remove an organization.
#[derive(Debug, Clone)]
pub struct RemoveOrganization {
    pub aggregate_id: String,
}

impl Command for RemoveOrganization {
    fn command_type(&self) -> &'static str {
        "org.remove"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("organization id", &self.aggregate_id)
    }
}
