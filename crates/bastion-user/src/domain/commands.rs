//! Commands for the user aggregate.

use bastion_core::command::{Command, require_non_empty};
use bastion_core::error::DomainError;

/// Language tag used when none is given ("undetermined").
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Accepts `local@domain` with exactly one `@` and no whitespace.
fn require_email(email: &str) -> Result<(), DomainError> {
    require_non_empty("email", email)?;
    let plausible = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !plausible {
        return Err(DomainError::invalid_argument(format!(
            "email is not a valid address: {email}"
        )));
    }
    Ok(())
}

fn require_if_present(field: &str, value: Option<&String>) -> Result<(), DomainError> {
    value.map_or(Ok(()), |v| require_non_empty(field, v))
}

/// Command to create a human user.
#[derive(Debug, Clone)]
pub struct AddHumanUser {
    /// Explicit id. Generated when absent or blank.
    pub aggregate_id: Option<String>,
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    /// Defaults to "given family".
    pub display_name: Option<String>,
    /// Defaults to [`UNDETERMINED_LANGUAGE`].
    pub preferred_language: Option<String>,
}

impl AddHumanUser {
    /// The caller-supplied id, if it is usable.
    #[must_use]
    pub fn requested_id(&self) -> Option<&str> {
        self.aggregate_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// The display name to store.
    #[must_use]
    pub fn resolved_display_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("{} {}", self.given_name.trim(), self.family_name.trim()),
        }
    }

    /// The preferred language to store.
    #[must_use]
    pub fn resolved_language(&self) -> String {
        match self.preferred_language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_owned(),
            _ => UNDETERMINED_LANGUAGE.to_owned(),
        }
    }
}

impl Command for AddHumanUser {
    fn command_type(&self) -> &'static str {
        "user.human.add"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("username", &self.username)?;
        require_email(&self.email)?;
        require_non_empty("given name", &self.given_name)?;
        require_non_empty("family name", &self.family_name)
    }
}

/// Command to change a human user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChangeHumanUser {
    pub aggregate_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub display_name: Option<String>,
    pub preferred_language: Option<String>,
}

impl Command for ChangeHumanUser {
    fn command_type(&self) -> &'static str {
        "user.human.change"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("user id", &self.aggregate_id)?;
        require_if_present("username", self.username.as_ref())?;
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        require_if_present("given name", self.given_name.as_ref())?;
        require_if_present("family name", self.family_name.as_ref())?;
        require_if_present("display name", self.display_name.as_ref())?;
        require_if_present("preferred language", self.preferred_language.as_ref())
    }
}

/// Command to remove a user.
#[derive(Debug, Clone)]
pub struct RemoveUser {
    pub aggregate_id: String,
}

impl Command for RemoveUser {
    fn command_type(&self) -> &'static str {
        "user.remove"
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("user id", &self.aggregate_id)
    }
}
