//! Lock-guarded access to event-sourced aggregates and key/value indexes.
//!
//! [`AggregateAccessProvider`] and [`IndexAccessProvider`] sit in front of a
//! backing store and make sure only one caller at a time mutates a given
//! aggregate or index key. Mutual exclusion comes from an injected
//! [`MutexFactory`]: [`InMemoryMutexFactory`] covers a single process, a
//! shared backend is needed across processes.
//!
//! ```ignore
//! use sourced_access::{GuardedAggregates, InMemoryEventStreamRepository, InMemoryMutexFactory};
//!
//! let provider = InMemoryEventStreamRepository::<Account>::new().guarded(InMemoryMutexFactory::new());
//!
//! let mut account = Account::open("acct-1", "alice");
//! provider.save(&mut account, &delivery).await?;   // insert
//!
//! let mut account = provider.load(&"acct-1".into()).await?.unwrap();  // lock stays held
//! account.deposit(10);
//! provider.save(&mut account, &delivery).await?;   // update, releases the lock
//! ```

mod aggregate;
mod delivery;
mod entity;
mod error;
mod guarded;
mod index;
mod lock;

pub use aggregate::{
    hydrate, Aggregate, AggregateAccessError, AggregateAccessProvider, AggregateId,
    EventStreamRepository, InMemoryEventStreamRepository, KnownAggregates, RevertMode,
    UnknownRevertMode,
};
#[cfg(feature = "emitter")]
pub use delivery::EmitterDelivery;
pub use delivery::{deliver_all, CollectingDelivery, DeliveryTarget, LogDelivery};
pub use entity::{Entity, EventRecord, Payload, PayloadError, AGGREGATE_ID_META};
pub use error::{AccessFailure, RepositoryError};
pub use guarded::{GuardedAggregates, GuardedIndex};
pub use index::{
    IndexAccessProvider, IndexKey, IndexOperation, IndexOperationFailed, IndexStore,
    InMemoryIndexStore,
};
pub use lock::{
    HeldLock, InMemoryLock, InMemoryMutex, InMemoryMutexFactory, Lock, LockError, LockKey,
    LockNamespace, LockOf, LockRegistry, Mutex, MutexFactory,
};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
