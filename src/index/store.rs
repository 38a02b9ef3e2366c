use async_trait::async_trait;

use crate::error::RepositoryError;

/// Key of an index entry.
///
/// `value` is the key's underlying value: the string the store keys rows by
/// and the identity a provider derives its lock key from.
pub trait IndexKey: Send + Sync {
    fn value(&self) -> String;
}

impl IndexKey for String {
    fn value(&self) -> String {
        self.clone()
    }
}

impl IndexKey for &str {
    fn value(&self) -> String {
        (*self).to_string()
    }
}

/// Key/value storage behind an [`IndexAccessProvider`](super::IndexAccessProvider).
///
/// `add` must report a uniqueness violation when the key already exists.
/// `add` and `update` return the number of affected rows.
#[async_trait]
pub trait IndexStore: Send + Sync {
    type Key: IndexKey;
    type Value: Send + Sync;

    async fn find(&self, key: &Self::Key) -> Result<Option<Self::Value>, RepositoryError>;

    async fn add(&self, key: &Self::Key, value: &Self::Value) -> Result<u64, RepositoryError>;

    async fn update(&self, key: &Self::Key, value: &Self::Value) -> Result<u64, RepositoryError>;

    async fn delete(&self, key: &Self::Key) -> Result<(), RepositoryError>;
}
