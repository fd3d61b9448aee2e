pub mod aggregates;
pub mod commands;
pub mod events;
