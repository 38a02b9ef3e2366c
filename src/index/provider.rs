use tracing::{debug, trace};

use super::{IndexKey, IndexOperation, IndexOperationFailed, IndexStore};
use crate::lock::{LockKey, LockRegistry, MutexFactory};

/// Lock-guarded access to an [`IndexStore`].
///
/// `add`, `update` and `remove` hold the key's lock for the duration of the
/// store call. `get` and `has` go straight to the store.
pub struct IndexAccessProvider<S, F: MutexFactory> {
    store: S,
    locks: LockRegistry<F>,
}

impl<S, F> IndexAccessProvider<S, F>
where
    S: IndexStore,
    F: MutexFactory,
{
    pub fn new(store: S, factory: F) -> Self {
        IndexAccessProvider {
            store,
            locks: LockRegistry::new(factory),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mutex_factory(&self) -> &F {
        self.locks.factory()
    }

    /// Number of index locks this provider currently holds.
    pub fn held_locks(&self) -> usize {
        self.locks.len()
    }

    pub async fn get(&self, key: &S::Key) -> Result<Option<S::Value>, IndexOperationFailed> {
        self.find(IndexOperation::Get, key).await
    }

    pub async fn has(&self, key: &S::Key) -> Result<bool, IndexOperationFailed> {
        Ok(self.find(IndexOperation::Has, key).await?.is_some())
    }

    /// Insert `value` under `key`. Returns `false` when the key already exists.
    pub async fn add(&self, key: &S::Key, value: &S::Value) -> Result<bool, IndexOperationFailed> {
        let lock_key = lock_key(key);
        let held = self
            .locks
            .acquire_exclusive(&lock_key)
            .await
            .map_err(|e| IndexOperationFailed::new(IndexOperation::Add, lock_key.clone(), e))?;

        let result = self.store.add(key, value).await;
        held.release_or_warn().await;

        match result {
            Ok(affected) => Ok(affected > 0),
            Err(err) if err.is_unique_violation() => {
                debug!(lock_key = %lock_key, "index entry already present");
                Ok(false)
            }
            Err(err) => Err(IndexOperationFailed::new(IndexOperation::Add, lock_key, err)),
        }
    }

    /// Replace the value under `key`. Returns `false` when no row was affected.
    pub async fn update(
        &self,
        key: &S::Key,
        value: &S::Value,
    ) -> Result<bool, IndexOperationFailed> {
        let lock_key = lock_key(key);
        let held = self
            .locks
            .acquire_exclusive(&lock_key)
            .await
            .map_err(|e| IndexOperationFailed::new(IndexOperation::Update, lock_key.clone(), e))?;

        let result = self.store.update(key, value).await;
        held.release_or_warn().await;

        result
            .map(|affected| affected > 0)
            .map_err(|err| IndexOperationFailed::new(IndexOperation::Update, lock_key, err))
    }

    pub async fn remove(&self, key: &S::Key) -> Result<(), IndexOperationFailed> {
        let lock_key = lock_key(key);
        let held = self
            .locks
            .acquire_exclusive(&lock_key)
            .await
            .map_err(|e| IndexOperationFailed::new(IndexOperation::Remove, lock_key.clone(), e))?;

        let result = self.store.delete(key).await;
        held.release_or_warn().await;

        result.map_err(|err| IndexOperationFailed::new(IndexOperation::Remove, lock_key, err))
    }

    async fn find(
        &self,
        operation: IndexOperation,
        key: &S::Key,
    ) -> Result<Option<S::Value>, IndexOperationFailed> {
        trace!(operation = %operation, "unguarded index read");
        self.store
            .find(key)
            .await
            .map_err(|err| IndexOperationFailed::new(operation, lock_key(key), err))
    }
}

fn lock_key<K: IndexKey>(key: &K) -> LockKey {
    LockKey::index(key.value())
}
