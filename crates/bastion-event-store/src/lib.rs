//! Event log store adapters.
//!
//! Both adapters implement `bastion_core::repository::EventRepository`:
//! atomic conditional append per aggregate stream plus ordered reads.

pub mod memory;
pub mod pg_event_repository;
pub mod schema;

pub use memory::InMemoryEventRepository;
pub use pg_event_repository::PgEventRepository;
