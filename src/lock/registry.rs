use std::collections::HashMap;
use std::pin::pin;
use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{trace, warn};

use super::{Lock, LockError, LockKey, LockOf, Mutex, MutexFactory};

struct Entry<L> {
    lock: L,
    /// Parked by [`HeldLock::keep`]; the next `acquire` of the key may take it over.
    kept: bool,
}

/// Locks currently held by one provider, keyed by [`LockKey`].
///
/// An entry is either in use by one running operation or kept between
/// operations. [`acquire`](Self::acquire) takes over a kept entry without going
/// back to the factory, so a `load` followed by a `save` of the same aggregate
/// runs as one critical section. An entry in use is never shared: other
/// callers wait on the backend mutex until the running operation releases the
/// key, or take it over once it is kept.
///
/// The map lock is never held across an `.await`.
pub struct LockRegistry<F: MutexFactory> {
    factory: F,
    held: StdMutex<HashMap<LockKey, Entry<LockOf<F>>>>,
    parked: Notify,
}

enum Claim {
    TookOver,
    Busy,
    Free,
}

impl<F: MutexFactory> LockRegistry<F> {
    pub fn new(factory: F) -> Self {
        LockRegistry {
            factory,
            held: StdMutex::new(HashMap::new()),
            parked: Notify::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Whether the key is held, in use or kept.
    pub fn is_held(&self, key: &LockKey) -> bool {
        self.snapshot().contains_key(key)
    }

    /// Whether the key is kept between operations.
    pub fn is_kept(&self, key: &LockKey) -> bool {
        self.snapshot().get(key).is_some_and(|entry| entry.kept)
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acquire `key` for one operation, taking over the lock if it is kept.
    ///
    /// The returned guard must be finished with [`HeldLock::release`] or
    /// [`HeldLock::keep`]. A guard dropped without either removes the entry
    /// and drops the lock handle.
    pub async fn acquire(&self, key: &LockKey) -> Result<HeldLock<'_, F>, LockError> {
        loop {
            let mut parked = pin!(self.parked.notified());
            parked.as_mut().enable();

            match self.claim(key)? {
                Claim::TookOver => {
                    trace!(lock_key = %key, "taking over kept lock");
                    return Ok(HeldLock::new(self, key.clone()));
                }
                Claim::Busy => trace!(lock_key = %key, "lock in use, waiting"),
                Claim::Free => {}
            }

            let mutex = self.factory.create(key)?;
            tokio::select! {
                acquired = mutex.acquire() => return self.register(key, acquired?),
                _ = parked.as_mut() => continue,
            }
        }
    }

    /// Acquire `key` through the backend mutex, never taking over a kept lock.
    ///
    /// For operations that always release what they acquire. A key kept by an
    /// earlier `acquire` stays locked until it is released.
    pub async fn acquire_exclusive(&self, key: &LockKey) -> Result<HeldLock<'_, F>, LockError> {
        let mutex = self.factory.create(key)?;
        let lock = mutex.acquire().await?;
        self.register(key, lock)
    }

    /// Release `key` if it is kept. No-op if it is not held; a key in use is
    /// left to the operation using it.
    pub async fn release(&self, key: &LockKey) -> Result<(), LockError> {
        let lock = {
            let mut held = self.held()?;
            match held.get(key).map(|entry| entry.kept) {
                Some(true) => held.remove(key).map(|entry| entry.lock),
                Some(false) => {
                    trace!(lock_key = %key, "release skipped, lock in use");
                    None
                }
                None => {
                    trace!(lock_key = %key, "release skipped, lock not held");
                    None
                }
            }
        };

        match lock {
            Some(lock) => self.release_lock(key, lock).await,
            None => Ok(()),
        }
    }

    /// Release every kept lock. Returns the first release error, after trying all.
    pub async fn release_all(&self) -> Result<(), LockError> {
        let kept: Vec<(LockKey, LockOf<F>)> = {
            let mut held = self.held()?;
            let keys: Vec<LockKey> = held
                .iter()
                .filter(|(_, entry)| entry.kept)
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| held.remove(&key).map(|entry| (key, entry.lock)))
                .collect()
        };

        let mut first_error = None;
        for (key, lock) in kept {
            if let Err(err) = self.release_lock(&key, lock).await {
                warn!(lock_key = %key, error = %err, "failed to release lock");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn claim(&self, key: &LockKey) -> Result<Claim, LockError> {
        let mut held = self.held()?;
        Ok(match held.get_mut(key) {
            Some(entry) if entry.kept => {
                entry.kept = false;
                Claim::TookOver
            }
            Some(_) => Claim::Busy,
            None => Claim::Free,
        })
    }

    fn register(&self, key: &LockKey, lock: LockOf<F>) -> Result<HeldLock<'_, F>, LockError> {
        let replaced = self.held()?.insert(key.clone(), Entry { lock, kept: false });
        if replaced.is_some() {
            warn!(lock_key = %key, "lock registered twice; dropping the older handle");
        }
        drop(replaced);

        trace!(lock_key = %key, "lock acquired");
        Ok(HeldLock::new(self, key.clone()))
    }

    fn park(&self, key: &LockKey) -> Result<(), LockError> {
        if let Some(entry) = self.held()?.get_mut(key) {
            entry.kept = true;
        }
        self.parked.notify_waiters();
        Ok(())
    }

    /// End the operation holding `key`. The entry is removed before the
    /// backend release is attempted, so a failed release never leaves a stale
    /// entry behind.
    async fn finish(&self, key: &LockKey) -> Result<(), LockError> {
        match self.take(key)? {
            Some(lock) => self.release_lock(key, lock).await,
            None => Ok(()),
        }
    }

    async fn release_lock(&self, key: &LockKey, lock: LockOf<F>) -> Result<(), LockError> {
        lock.release().await?;
        trace!(lock_key = %key, "lock released");
        Ok(())
    }

    fn take(&self, key: &LockKey) -> Result<Option<LockOf<F>>, LockError> {
        Ok(self.held()?.remove(key).map(|entry| entry.lock))
    }

    fn held(&self) -> Result<MutexGuard<'_, HashMap<LockKey, Entry<LockOf<F>>>>, LockError> {
        self.held
            .lock()
            .map_err(|_| LockError::Poisoned("lock registry poisoned".into()))
    }

    // Read-only views recover the map instead of failing.
    fn snapshot(&self) -> MutexGuard<'_, HashMap<LockKey, Entry<LockOf<F>>>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A key held in a [`LockRegistry`] for the duration of one operation.
#[must_use = "a held lock must be released or kept"]
pub struct HeldLock<'a, F: MutexFactory> {
    registry: &'a LockRegistry<F>,
    key: LockKey,
    armed: bool,
}

impl<'a, F: MutexFactory> HeldLock<'a, F> {
    fn new(registry: &'a LockRegistry<F>, key: LockKey) -> Self {
        HeldLock {
            registry,
            key,
            armed: true,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Leave the key held after this operation returns, for the next
    /// `acquire` of the same key to take over.
    pub fn keep(mut self) {
        self.armed = false;
        match self.registry.park(&self.key) {
            Ok(()) => trace!(lock_key = %self.key, "lock kept for a follow-up call"),
            Err(err) => warn!(lock_key = %self.key, error = %err, "could not keep lock"),
        }
    }

    /// Release the key now.
    pub async fn release(mut self) -> Result<(), LockError> {
        self.armed = false;
        self.registry.finish(&self.key).await
    }

    /// Release the key now, logging instead of returning a failed release.
    ///
    /// The registry entry is gone either way; callers use this where the
    /// guarded operation's own outcome is what must be reported.
    pub async fn release_or_warn(self) {
        let key = self.key.clone();
        if let Err(err) = self.release().await {
            warn!(lock_key = %key, error = %err, "failed to release lock");
        }
    }
}

impl<F: MutexFactory> Drop for HeldLock<'_, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        match self.registry.take(&self.key) {
            Ok(Some(lock)) => {
                warn!(lock_key = %self.key, "operation ended without releasing its lock; dropping handle");
                drop(lock);
            }
            Ok(None) => {}
            Err(err) => warn!(lock_key = %self.key, error = %err, "could not drop held lock"),
        }
    }
}
