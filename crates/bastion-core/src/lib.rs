//! Shared event-sourcing abstractions for Bastion.
//!
//! This crate defines the aggregate identity, event log contract, generic
//! write-model reducer, and command context that every aggregate context
//! depends on. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod details;
pub mod error;
pub mod event;
pub mod eventually;
pub mod id;
pub mod repository;
pub mod write_model;
