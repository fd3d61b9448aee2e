//! Eventually consistent read model.
//!
//! A [`projector::Projector`] tails the global event log and folds events
//! into the views held by a [`store::ProjectionStore`]. Reads go through
//! [`query_handlers`] and lag writes by at least one poll interval; callers
//! that need their own write poll with `bastion_core::eventually`.

pub mod projector;
pub mod query;
pub mod query_handlers;
pub mod store;
pub mod views;

pub use projector::{Projector, ProjectorConfig, ProjectorHandle};
pub use store::ProjectionStore;
