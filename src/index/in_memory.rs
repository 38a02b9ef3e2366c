//! InMemoryIndexStore - HashMap-backed index store for testing and development.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::{IndexKey, IndexStore};
use crate::error::RepositoryError;

/// In-memory index store. Values are kept as JSON bytes keyed by
/// [`IndexKey::value`]. Clones share the same storage.
pub struct InMemoryIndexStore<K, V> {
    rows: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for InMemoryIndexStore<K, V> {
    fn clone(&self) -> Self {
        InMemoryIndexStore {
            rows: Arc::clone(&self.rows),
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for InMemoryIndexStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryIndexStore<K, V> {
    pub fn new() -> Self {
        InMemoryIndexStore {
            rows: Arc::new(RwLock::new(HashMap::new())),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn encode<V: Serialize>(value: &V) -> Result<Vec<u8>, RepositoryError> {
    serde_json::to_vec(value).map_err(|e| RepositoryError::Serde(e.to_string()))
}

#[async_trait]
impl<K, V> IndexStore for InMemoryIndexStore<K, V>
where
    K: IndexKey,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    type Key = K;
    type Value = V;

    async fn find(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("index read"))?;

        match rows.get(&key.value()) {
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| RepositoryError::Serde(e.to_string())),
            None => Ok(None),
        }
    }

    async fn add(&self, key: &K, value: &V) -> Result<u64, RepositoryError> {
        let bytes = encode(value)?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("index add"))?;

        let key = key.value();
        if rows.contains_key(&key) {
            return Err(RepositoryError::UniqueViolation { key });
        }
        rows.insert(key, bytes);
        Ok(1)
    }

    async fn update(&self, key: &K, value: &V) -> Result<u64, RepositoryError> {
        let bytes = encode(value)?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("index update"))?;

        match rows.get_mut(&key.value()) {
            Some(row) => {
                *row = bytes;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, key: &K) -> Result<(), RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("index delete"))?;
        rows.remove(&key.value());
        Ok(())
    }
}
