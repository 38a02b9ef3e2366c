mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sourced_access::{
    GuardedIndex, IndexAccessProvider, IndexKey, IndexOperation, IndexStore, InMemoryIndexStore,
    InMemoryMutexFactory, LockError, LockKey, Mutex, MutexFactory, RepositoryError,
};
use support::init_tracing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Owner {
    account_id: String,
}

fn owner(account_id: &str) -> Owner {
    Owner {
        account_id: account_id.to_string(),
    }
}

type Index = IndexAccessProvider<InMemoryIndexStore<String, Owner>, InMemoryMutexFactory>;

fn index() -> Index {
    init_tracing();
    InMemoryIndexStore::new().guarded_index(InMemoryMutexFactory::new())
}

/// Email addresses compare case-insensitively.
struct EmailKey(String);

impl IndexKey for EmailKey {
    fn value(&self) -> String {
        self.0.to_lowercase()
    }
}

/// Index store that stalls every write and records how many overlap.
#[derive(Default)]
struct SlowStore {
    inner: InMemoryIndexStore<String, Owner>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowStore {
    async fn write<T>(&self, write: impl std::future::Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let result = write.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl IndexStore for SlowStore {
    type Key = String;
    type Value = Owner;

    async fn find(&self, key: &String) -> Result<Option<Owner>, RepositoryError> {
        self.inner.find(key).await
    }

    async fn add(&self, key: &String, value: &Owner) -> Result<u64, RepositoryError> {
        self.write(self.inner.add(key, value)).await
    }

    async fn update(&self, key: &String, value: &Owner) -> Result<u64, RepositoryError> {
        self.write(self.inner.update(key, value)).await
    }

    async fn delete(&self, key: &String) -> Result<(), RepositoryError> {
        self.write(self.inner.delete(key)).await
    }
}

#[tokio::test]
async fn index_lifecycle() {
    let index = index();
    let key = "alice@example.com".to_string();

    assert!(index.add(&key, &owner("v1")).await.unwrap());
    assert!(!index.add(&key, &owner("v1")).await.unwrap());

    assert!(index.update(&key, &owner("v2")).await.unwrap());
    assert_eq!(index.get(&key).await.unwrap(), Some(owner("v2")));

    index.remove(&key).await.unwrap();
    assert_eq!(index.get(&key).await.unwrap(), None);
    assert!(!index.has(&key).await.unwrap());

    assert_eq!(index.held_locks(), 0);
    assert!(!index
        .mutex_factory()
        .is_locked(&LockKey::index(&key))
        .unwrap());
}

#[tokio::test]
async fn second_add_keeps_first_value() {
    let index = index();
    let key = "k".to_string();

    assert!(index.add(&key, &owner("first")).await.unwrap());
    assert!(!index.add(&key, &owner("second")).await.unwrap());

    assert_eq!(index.get(&key).await.unwrap(), Some(owner("first")));
    assert_eq!(index.store().len(), 1);
}

#[tokio::test]
async fn has_agrees_with_get() {
    let index = index();
    let present = "present".to_string();
    let absent = "absent".to_string();
    index.add(&present, &owner("a1")).await.unwrap();

    for key in [&present, &absent] {
        let found = index.get(key).await.unwrap();
        assert_eq!(index.has(key).await.unwrap(), found.is_some());
    }
}

#[tokio::test]
async fn update_of_missing_key_reports_false() {
    let index = index();
    let key = "missing".to_string();

    assert!(!index.update(&key, &owner("v1")).await.unwrap());
    assert!(!index.has(&key).await.unwrap());
}

#[tokio::test]
async fn remove_of_missing_key_is_ok() {
    let index = index();
    index.remove(&"missing".to_string()).await.unwrap();
    assert_eq!(index.held_locks(), 0);
}

#[tokio::test]
async fn concurrent_adds_of_one_key_admit_exactly_one() {
    init_tracing();
    let store = InMemoryIndexStore::<String, Owner>::new();
    let factory = InMemoryMutexFactory::new();
    let first = IndexAccessProvider::new(store.clone(), factory.clone());
    let second = IndexAccessProvider::new(store.clone(), factory);
    let key = "bob@example.com".to_string();

    let owner_first = owner("from-first");
    let owner_second = owner("from-second");
    let (a, b) = tokio::join!(
        first.add(&key, &owner_first),
        second.add(&key, &owner_second),
    );
    let admitted = [a.unwrap(), b.unwrap()];
    assert_eq!(admitted.iter().filter(|added| **added).count(), 1);

    let stored = first.get(&key).await.unwrap().unwrap();
    let expected = if admitted[0] { "from-first" } else { "from-second" };
    assert_eq!(stored.account_id, expected);
}

#[tokio::test]
async fn key_value_drives_storage_and_locking() {
    init_tracing();
    let index = InMemoryIndexStore::<EmailKey, Owner>::new().guarded_index(InMemoryMutexFactory::new());

    assert!(index
        .add(&EmailKey("Carol@Example.com".into()), &owner("a1"))
        .await
        .unwrap());
    assert!(!index
        .add(&EmailKey("carol@example.COM".into()), &owner("a2"))
        .await
        .unwrap());
    assert_eq!(
        index.get(&EmailKey("CAROL@EXAMPLE.COM".into())).await.unwrap(),
        Some(owner("a1"))
    );
}

#[tokio::test]
async fn held_key_surfaces_as_operation_failure() {
    init_tracing();
    let factory = InMemoryMutexFactory::new().with_acquire_timeout(Duration::from_millis(20));
    let index = InMemoryIndexStore::<String, Owner>::new().guarded_index(factory.clone());
    let key = "dave@example.com".to_string();
    let lock_key = LockKey::index(&key);

    let outside = factory.create(&lock_key).unwrap().acquire().await.unwrap();

    let err = index.add(&key, &owner("a1")).await.unwrap_err();
    assert_eq!(err.operation, IndexOperation::Add);
    assert_eq!(err.lock_key, lock_key);
    assert!(matches!(
        err.source.as_lock(),
        Some(LockError::Timeout { .. })
    ));
    assert!(err.to_string().starts_with("index add failed for "));

    // Reads never take the lock.
    assert_eq!(index.get(&key).await.unwrap(), None);

    sourced_access::Lock::release(&outside).await.unwrap();
    assert!(index.add(&key, &owner("a1")).await.unwrap());
}

#[tokio::test]
async fn shared_provider_serializes_writes_to_one_key() {
    init_tracing();
    let index = Arc::new(SlowStore::default().guarded_index(InMemoryMutexFactory::new()));
    let key = "erin@example.com".to_string();
    index.add(&key, &owner("v0")).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..3 {
        let index = Arc::clone(&index);
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            index.update(&key, &owner(&format!("v{}", n + 1))).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    assert_eq!(index.store().peak.load(Ordering::SeqCst), 1);
    assert_eq!(index.held_locks(), 0);
    assert!(!index
        .mutex_factory()
        .is_locked(&LockKey::index(&key))
        .unwrap());
}

#[tokio::test]
async fn shared_provider_admits_one_concurrent_add() {
    init_tracing();
    let index = Arc::new(SlowStore::default().guarded_index(InMemoryMutexFactory::new()));

    let mut handles = Vec::new();
    for n in 0..3 {
        let index = Arc::clone(&index);
        handles.push(tokio::spawn(async move {
            index.add(&"frank@example.com".to_string(), &owner(&format!("a{n}"))).await
        }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(index.store().peak.load(Ordering::SeqCst), 1);
}
