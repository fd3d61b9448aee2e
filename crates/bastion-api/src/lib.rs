//! HTTP surface of the Bastion identity backend.
//!
//! Library half of the API server so integration tests can build the same
//! router the binary serves.

pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
