use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sourced_access::{
    AggregateId, EventRecord, EventStreamRepository, InMemoryEventStreamRepository,
    RepositoryError, RevertMode,
};

use super::Account;

#[derive(Default)]
pub struct Stats {
    pub loads: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub reverts: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Stats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory repository that counts calls, tracks overlapping writes and can
/// stall each write to widen race windows. Clones share storage and stats.
#[derive(Clone)]
pub struct RecordingRepository {
    pub inner: InMemoryEventStreamRepository<Account>,
    pub stats: Arc<Stats>,
    write_delay: Option<Duration>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        RecordingRepository {
            inner: InMemoryEventStreamRepository::new(),
            stats: Arc::new(Stats::default()),
            write_delay: None,
        }
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    async fn enter_write(&self) {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave_write(&self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventStreamRepository for RecordingRepository {
    type Aggregate = Account;
    type Event = EventRecord;

    async fn load(&self, id: &AggregateId) -> Result<Option<Account>, RepositoryError> {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(id).await
    }

    async fn save(&self, aggregate: &mut Account) -> Result<Vec<EventRecord>, RepositoryError> {
        self.stats.inserts.fetch_add(1, Ordering::SeqCst);
        self.enter_write().await;
        let result = self.inner.save(aggregate).await;
        self.leave_write();
        result
    }

    async fn update(&self, aggregate: &mut Account) -> Result<Vec<EventRecord>, RepositoryError> {
        self.stats.updates.fetch_add(1, Ordering::SeqCst);
        self.enter_write().await;
        let result = self.inner.update(aggregate).await;
        self.leave_write();
        result
    }

    async fn revert(
        &self,
        aggregate: Account,
        to_version: u64,
        mode: RevertMode,
    ) -> Result<Account, RepositoryError> {
        self.stats.reverts.fetch_add(1, Ordering::SeqCst);
        self.inner.revert(aggregate, to_version, mode).await
    }
}
