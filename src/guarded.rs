use crate::aggregate::{AggregateAccessProvider, EventStreamRepository};
use crate::index::{IndexAccessProvider, IndexStore};
use crate::lock::MutexFactory;

/// Builder trait for wrapping an event stream repository with per-aggregate locking.
pub trait GuardedAggregates: EventStreamRepository + Sized {
    fn guarded<F: MutexFactory>(self, factory: F) -> AggregateAccessProvider<Self, F> {
        AggregateAccessProvider::new(self, factory)
    }
}

impl<T: EventStreamRepository> GuardedAggregates for T {}

/// Builder trait for wrapping an index store with per-key locking.
pub trait GuardedIndex: IndexStore + Sized {
    fn guarded_index<F: MutexFactory>(self, factory: F) -> IndexAccessProvider<Self, F> {
        IndexAccessProvider::new(self, factory)
    }
}

impl<T: IndexStore> GuardedIndex for T {}
