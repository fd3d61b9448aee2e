//! Shared test mocks and utilities for the Bastion identity backend.

mod clock;
mod id;
mod repository;

pub use clock::{FixedClock, fixed_now};
pub use id::SequenceIdGenerator;
pub use repository::{
    ConflictingEventRepository, EmptyEventRepository, FailingEventRepository,
    RecordingEventRepository, stored_event,
};
