use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{Lock, LockError, LockKey, Mutex, MutexFactory};

/// Lock held on an [`InMemoryMutex`].
///
/// Wraps an owned `tokio` guard. `release` drops the guard; dropping the lock
/// without releasing it has the same effect.
pub struct InMemoryLock {
    key: LockKey,
    guard: StdMutex<Option<OwnedMutexGuard<()>>>,
}

impl InMemoryLock {
    pub fn key(&self) -> &LockKey {
        &self.key
    }
}

#[async_trait]
impl Lock for InMemoryLock {
    async fn release(&self) -> Result<(), LockError> {
        let guard = self
            .guard
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?
            .take();
        drop(guard);
        Ok(())
    }
}

/// A per-key mutex handed out by [`InMemoryMutexFactory`].
pub struct InMemoryMutex {
    key: LockKey,
    inner: Arc<AsyncMutex<()>>,
    acquire_timeout: Option<Duration>,
}

#[async_trait]
impl Mutex for InMemoryMutex {
    type Lock = InMemoryLock;

    async fn acquire(&self) -> Result<InMemoryLock, LockError> {
        let acquire = Arc::clone(&self.inner).lock_owned();
        let guard = match self.acquire_timeout {
            Some(after) => tokio::time::timeout(after, acquire)
                .await
                .map_err(|_| LockError::Timeout {
                    key: self.key.to_string(),
                    after,
                })?,
            None => acquire.await,
        };

        Ok(InMemoryLock {
            key: self.key.clone(),
            guard: StdMutex::new(Some(guard)),
        })
    }
}

/// In-memory mutex factory backed by a `HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>`.
///
/// This is the default `MutexFactory`. It lazily creates one mutex per unique
/// key and hands out the same one for repeated lookups. Clones share the same
/// map, so providers built from clones of one factory exclude each other.
/// Exclusion never reaches beyond the current process.
#[derive(Clone, Default)]
pub struct InMemoryMutexFactory {
    mutexes: Arc<StdMutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>,
    acquire_timeout: Option<Duration>,
}

impl InMemoryMutexFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail acquires that have waited longer than `timeout` with [`LockError::Timeout`].
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }

    /// Whether the mutex for `key` is currently held by anyone.
    pub fn is_locked(&self, key: &LockKey) -> Result<bool, LockError> {
        let mutexes = self
            .mutexes
            .lock()
            .map_err(|_| LockError::Poisoned("mutex factory map poisoned".into()))?;
        Ok(mutexes
            .get(key)
            .map(|mutex| mutex.try_lock().is_err())
            .unwrap_or(false))
    }

    /// Number of distinct keys a mutex has been created for.
    pub fn len(&self) -> usize {
        self.mutexes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MutexFactory for InMemoryMutexFactory {
    type Mutex = InMemoryMutex;

    fn create(&self, key: &LockKey) -> Result<InMemoryMutex, LockError> {
        let mut mutexes = self
            .mutexes
            .lock()
            .map_err(|_| LockError::Poisoned("mutex factory map poisoned".into()))?;
        let inner = mutexes
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        Ok(InMemoryMutex {
            key: key.clone(),
            inner,
            acquire_timeout: self.acquire_timeout,
        })
    }
}
