//! Response metadata returned by every write operation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::WriteModelRoot;

/// Lets a caller detect or await the effect of its own write downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDetails {
    /// The aggregate id.
    pub id: String,
    /// The owning tenant.
    pub resource_owner: String,
    /// Sequence of the aggregate after the operation.
    pub sequence: i64,
    /// Timestamp of the last applied event.
    pub change_date: Option<DateTime<Utc>>,
}

impl From<&WriteModelRoot> for ObjectDetails {
    fn from(root: &WriteModelRoot) -> Self {
        Self {
            id: root.aggregate.aggregate_id.clone(),
            resource_owner: root.aggregate.resource_owner.clone(),
            sequence: root.sequence,
            change_date: root.change_date,
        }
    }
}
