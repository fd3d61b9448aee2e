//! Target aggregate.
//!
//! Targets are external endpoints (webhooks, request/response calls) that
//! actions execute against. Add, change and delete follow the shared
//! event-sourced lifecycle.

pub mod application;
pub mod domain;
