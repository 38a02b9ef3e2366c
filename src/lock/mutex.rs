use async_trait::async_trait;

use super::{Lock, LockError, LockKey};

/// A named mutex obtained from a [`MutexFactory`].
#[async_trait]
pub trait Mutex: Send + Sync {
    /// The lock handle produced by a successful acquire.
    type Lock: Lock;

    /// Acquire the mutex, suspending until it becomes available.
    async fn acquire(&self) -> Result<Self::Lock, LockError>;
}

/// Factory trait for obtaining per-key mutexes.
///
/// `AggregateAccessProvider` and `IndexAccessProvider` use a `MutexFactory`
/// to obtain a mutex for each aggregate or index key. The default
/// `InMemoryMutexFactory` only excludes callers inside one process; a
/// deployment with several processes needs a shared backend.
pub trait MutexFactory: Send + Sync {
    /// The concrete mutex type returned by this factory.
    type Mutex: Mutex;

    /// Get (or create) the mutex named by `key`.
    ///
    /// Repeated calls with the same key must return the same logical mutex
    /// (the same in-memory primitive, or the same distributed lock name).
    fn create(&self, key: &LockKey) -> Result<Self::Mutex, LockError>;
}

/// The lock type handed out by a factory's mutexes.
pub type LockOf<F> = <<F as MutexFactory>::Mutex as Mutex>::Lock;
