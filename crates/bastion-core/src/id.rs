//! Aggregate identity generation.
//!
//! In production, new aggregates receive time-ordered UUIDs. In tests, a
//! predetermined sequence is injected so ids are known up front.

use uuid::Uuid;

/// Abstraction over aggregate id generation.
pub trait IdGenerator: Send + Sync {
    /// Returns a new, globally unique aggregate id.
    fn next_id(&self) -> String;
}

/// Generates UUIDv7 ids, which sort by creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7IdGenerator;

impl IdGenerator for UuidV7IdGenerator {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_v7_ids_are_unique_and_parseable() {
        let generator = UuidV7IdGenerator;

        let first = generator.next_id();
        let second = generator.next_id();

        assert_ne!(first, second);
        assert_eq!(Uuid::parse_str(&first).unwrap().get_version_num(), 7);
    }
}
