//! Per-identity mutual exclusion.
//!
//! Providers never talk to a lock backend directly. They derive a [`LockKey`]
//! for the identity they are about to touch and go through their own
//! [`LockRegistry`], which obtains mutexes from the injected [`MutexFactory`].

mod error;
mod in_memory;
mod key;
mod lock;
mod mutex;
mod registry;

pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryMutex, InMemoryMutexFactory};
pub use key::{LockKey, LockNamespace};
pub use lock::Lock;
pub use mutex::{LockOf, Mutex, MutexFactory};
pub use registry::{HeldLock, LockRegistry};
