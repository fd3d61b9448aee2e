//! Test id generator: deterministic `IdGenerator` implementation for tests.

use std::sync::Mutex;

use bastion_core::id::IdGenerator;

/// An id generator that returns values from a predetermined sequence.
/// Panics if the sequence is exhausted.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    ids: Mutex<std::vec::IntoIter<String>>,
}

impl SequenceIdGenerator {
    /// Create a new `SequenceIdGenerator` with the given ids.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        Self {
            ids: Mutex::new(ids.into_iter()),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> String {
        self.ids
            .lock()
            .unwrap()
            .next()
            .expect("SequenceIdGenerator exhausted")
    }
}
