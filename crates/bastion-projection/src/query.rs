//! Search predicates, sorting and pagination for list queries.
//!
//! Predicates in one request are combined with logical AND.

use std::cmp::Ordering;

use bastion_core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::views::{OrganizationView, TargetView, UserView, View};

/// Page size used when the request does not name one.
pub const DEFAULT_LIMIT: usize = 100;
/// Largest page a request may ask for.
pub const MAX_LIMIT: usize = 1000;

/// How a text predicate compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMethod {
    #[default]
    Equals,
    EqualsIgnoreCase,
    StartsWith,
    Contains,
}

impl TextMethod {
    /// Whether `value` matches `pattern` under this method.
    #[must_use]
    pub fn matches(self, value: &str, pattern: &str) -> bool {
        match self {
            Self::Equals => value == pattern,
            Self::EqualsIgnoreCase => value.to_lowercase() == pattern.to_lowercase(),
            Self::StartsWith => value.starts_with(pattern),
            Self::Contains => value.contains(pattern),
        }
    }
}

/// A text predicate on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuery {
    pub value: String,
    #[serde(default)]
    pub method: TextMethod,
}

impl TextQuery {
    fn matches(&self, value: &str) -> bool {
        self.method.matches(value, &self.value)
    }
}

/// Predicates over users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSearchQuery {
    InUserIds(Vec<String>),
    InEmails(Vec<String>),
    Username(TextQuery),
    Email(TextQuery),
    DisplayName(TextQuery),
    ResourceOwner(String),
}

impl UserSearchQuery {
    #[must_use]
    pub fn matches(&self, view: &UserView) -> bool {
        match self {
            Self::InUserIds(ids) => ids.contains(&view.details.id),
            Self::InEmails(emails) => emails.contains(&view.email),
            Self::Username(q) => q.matches(&view.username),
            Self::Email(q) => q.matches(&view.email),
            Self::DisplayName(q) => q.matches(&view.display_name),
            Self::ResourceOwner(owner) => view.details.resource_owner == *owner,
        }
    }
}

/// Predicates over targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSearchQuery {
    InTargetIds(Vec<String>),
    Name(TextQuery),
}

impl TargetSearchQuery {
    #[must_use]
    pub fn matches(&self, view: &TargetView) -> bool {
        match self {
            Self::InTargetIds(ids) => ids.contains(&view.details.id),
            Self::Name(q) => q.matches(&view.name),
        }
    }
}

/// Predicates over organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationSearchQuery {
    InOrganizationIds(Vec<String>),
    Name(TextQuery),
}

impl OrganizationSearchQuery {
    #[must_use]
    pub fn matches(&self, view: &OrganizationView) -> bool {
        match self {
            Self::InOrganizationIds(ids) => ids.contains(&view.details.id),
            Self::Name(q) => q.matches(&view.name),
        }
    }
}

/// Columns a user list can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortingColumn {
    #[default]
    CreationDate,
    ChangeDate,
    Username,
    Email,
    DisplayName,
}

/// Columns a target list can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSortingColumn {
    #[default]
    CreationDate,
    ChangeDate,
    Name,
}

/// Columns an organization list can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationSortingColumn {
    #[default]
    CreationDate,
    Name,
}

/// Something a view can be ordered by.
pub trait SortingColumn<V>: Copy {
    fn compare(self, a: &V, b: &V) -> Ordering;
}

fn by_date(a: DateTime<Utc>, b: DateTime<Utc>) -> Ordering {
    a.cmp(&b)
}

impl SortingColumn<UserView> for UserSortingColumn {
    fn compare(self, a: &UserView, b: &UserView) -> Ordering {
        match self {
            Self::CreationDate => by_date(a.details.creation_date, b.details.creation_date),
            Self::ChangeDate => by_date(a.details.change_date, b.details.change_date),
            Self::Username => a.username.cmp(&b.username),
            Self::Email => a.email.cmp(&b.email),
            Self::DisplayName => a.display_name.cmp(&b.display_name),
        }
    }
}

impl SortingColumn<TargetView> for TargetSortingColumn {
    fn compare(self, a: &TargetView, b: &TargetView) -> Ordering {
        match self {
            Self::CreationDate => by_date(a.details.creation_date, b.details.creation_date),
            Self::ChangeDate => by_date(a.details.change_date, b.details.change_date),
            Self::Name => a.name.cmp(&b.name),
        }
    }
}

impl SortingColumn<OrganizationView> for OrganizationSortingColumn {
    fn compare(self, a: &OrganizationView, b: &OrganizationView) -> Ordering {
        match self {
            Self::CreationDate => by_date(a.details.creation_date, b.details.creation_date),
            Self::Name => a.name.cmp(&b.name),
        }
    }
}

/// Sorting and pagination of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "S: Deserialize<'de> + Default"))]
pub struct ListQuery<S> {
    pub offset: usize,
    /// `None` or 0 means [`DEFAULT_LIMIT`].
    pub limit: Option<usize>,
    pub asc: bool,
    pub sorting_column: S,
}

impl<S: Default> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: None,
            asc: true,
            sorting_column: S::default(),
        }
    }
}

impl<S> ListQuery<S> {
    /// The effective page size.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if the limit exceeds
    /// [`MAX_LIMIT`].
    pub fn effective_limit(&self) -> Result<usize, DomainError> {
        match self.limit {
            None | Some(0) => Ok(DEFAULT_LIMIT),
            Some(limit) if limit > MAX_LIMIT => Err(DomainError::invalid_argument(format!(
                "limit must not exceed {MAX_LIMIT}"
            ))),
            Some(limit) => Ok(limit),
        }
    }

    /// Sorts `matches` and cuts out the requested page. Ties are broken by
    /// id so pages are stable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` for an oversized limit.
    pub fn page<V>(&self, mut matches: Vec<V>) -> Result<Vec<V>, DomainError>
    where
        V: View,
        S: SortingColumn<V>,
    {
        let limit = self.effective_limit()?;
        matches.sort_by(|a, b| {
            let ordering = self
                .sorting_column
                .compare(a, b)
                .then_with(|| a.details().id.cmp(&b.details().id));
            if self.asc { ordering } else { ordering.reverse() }
        });
        Ok(matches.into_iter().skip(self.offset).take(limit).collect())
    }
}

/// A list request: predicates plus sorting and pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    default,
    bound(deserialize = "Q: Deserialize<'de>, S: Deserialize<'de> + Default")
)]
pub struct SearchRequest<Q, S> {
    pub query: ListQuery<S>,
    pub queries: Vec<Q>,
}

impl<Q, S: Default> Default for SearchRequest<Q, S> {
    fn default() -> Self {
        Self {
            query: ListQuery::default(),
            queries: Vec::new(),
        }
    }
}

pub type UserSearchRequest = SearchRequest<UserSearchQuery, UserSortingColumn>;
pub type TargetSearchRequest = SearchRequest<TargetSearchQuery, TargetSortingColumn>;
pub type OrganizationSearchRequest =
    SearchRequest<OrganizationSearchQuery, OrganizationSortingColumn>;

/// Freshness and size of a list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDetails {
    /// Matches before pagination.
    pub total_count: u64,
    /// Global position the read model had reached.
    pub processed_position: i64,
    /// When the read model last caught up with the log.
    pub timestamp: DateTime<Utc>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponse<V> {
    pub results: Vec<V>,
    pub details: ListDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_methods() {
        assert!(TextMethod::Equals.matches("ada", "ada"));
        assert!(!TextMethod::Equals.matches("Ada", "ada"));
        assert!(TextMethod::EqualsIgnoreCase.matches("Ada", "aDA"));
        assert!(TextMethod::StartsWith.matches("ada.lovelace", "ada"));
        assert!(TextMethod::Contains.matches("ada.lovelace", "love"));
        assert!(!TextMethod::Contains.matches("ada", "grace"));
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        let mut query = ListQuery::<TargetSortingColumn>::default();
        assert_eq!(query.effective_limit().unwrap(), DEFAULT_LIMIT);

        query.limit = Some(MAX_LIMIT);
        assert_eq!(query.effective_limit().unwrap(), MAX_LIMIT);

        query.limit = Some(MAX_LIMIT + 1);
        assert!(matches!(
            query.effective_limit(),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_search_request_deserializes_tagged_predicates() {
        let json = serde_json::json!({
            "query": { "limit": 10, "asc": false, "sorting_column": "username" },
            "queries": [
                { "in_user_ids": ["u-1", "u-2"] },
                { "username": { "value": "ada", "method": "starts_with" } },
                { "email": { "value": "ada@example.com" } }
            ]
        });

        let request: UserSearchRequest = serde_json::from_value(json).unwrap();

        assert_eq!(request.query.limit, Some(10));
        assert!(!request.query.asc);
        assert_eq!(request.query.sorting_column, UserSortingColumn::Username);
        assert_eq!(request.queries.len(), 3);
        assert_eq!(
            request.queries[2],
            UserSearchQuery::Email(TextQuery {
                value: "ada@example.com".to_owned(),
                method: TextMethod::Equals,
            })
        );
    }

    #[test]
    fn test_empty_request_uses_defaults() {
        let request: TargetSearchRequest = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(request.queries.is_empty());
        assert!(request.query.asc);
        assert_eq!(request.query.offset, 0);
    }
}
