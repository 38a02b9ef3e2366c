use async_trait::async_trait;

use super::LockError;

/// A held lock, returned by [`Mutex::acquire`](super::Mutex::acquire).
///
/// In-memory locks wrap an owned `tokio` mutex guard; distributed locks might
/// hold a Redis token, a Postgres advisory lock session, an etcd lease, etc.
///
/// `release` is not required to be idempotent: the [`LockRegistry`](super::LockRegistry)
/// guarantees it is called at most once per acquisition. Implementations should
/// still release on `Drop` where the backend allows it, since a cancelled
/// operation drops its lock without awaiting `release`.
#[async_trait]
pub trait Lock: Send + Sync {
    /// Release the lock.
    async fn release(&self) -> Result<(), LockError>;
}
