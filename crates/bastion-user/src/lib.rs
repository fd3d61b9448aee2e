//! Human user aggregate.
//!
//! Users carry a username, an email address and profile names. They are
//! owned by an organization and share the add/change/remove lifecycle of
//! every other aggregate.

pub mod application;
pub mod domain;
