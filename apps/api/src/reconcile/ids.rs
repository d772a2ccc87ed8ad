//! Identity generation for records, conflict groups and review items.
//!
//! Everything that needs a fresh id takes an `&dyn IdGenerator` so tests can
//! swap in deterministic ids.

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs. Used by the running service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable `<prefix>-<n>` ids, counting from 1.
#[cfg(test)]
pub struct SequentialIds {
    prefix: &'static str,
    counter: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl SequentialIds {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidIdGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_sequential_ids_count_up() {
        let ids = SequentialIds::new("g");
        assert_eq!(ids.next_id(), "g-1");
        assert_eq!(ids.next_id(), "g-2");
    }
}
