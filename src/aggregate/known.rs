use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::AggregateId;

/// Aggregate ids this provider has loaded or saved, with their concrete type.
///
/// An id missing here makes the next `save` take the insert path. Entries are
/// never evicted, so the map grows with every distinct aggregate a provider
/// touches.
#[derive(Debug, Default)]
pub struct KnownAggregates {
    entries: Mutex<HashMap<String, &'static str>>,
}

impl KnownAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &AggregateId) -> bool {
        self.entries().contains_key(id.as_str())
    }

    pub fn type_of(&self, id: &AggregateId) -> Option<&'static str> {
        self.entries().get(id.as_str()).copied()
    }

    pub fn mark(&self, id: &AggregateId, type_name: &'static str) {
        self.entries().insert(id.as_str().to_string(), type_name);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map holds plain data; a panic elsewhere cannot leave it half-written.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, &'static str>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
