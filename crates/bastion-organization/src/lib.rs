//! Organization aggregate.
//!
//! An organization is the tenant that owns users and targets. It owns
//! itself: its resource owner is its own id.

pub mod application;
pub mod domain;
