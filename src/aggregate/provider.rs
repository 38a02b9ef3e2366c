use tracing::{debug, trace};

use super::{
    Aggregate, AggregateAccessError, AggregateId, EventStreamRepository, KnownAggregates,
    RevertMode,
};
use crate::delivery::{deliver_all, DeliveryTarget};
use crate::lock::{LockError, LockKey, LockRegistry, MutexFactory};

/// Lock-guarded access to an [`EventStreamRepository`].
///
/// Every `load`, `save` and `revert` runs under the aggregate's lock. The lock
/// taken by a successful `load` stays held so the following `save` or
/// `revert` of the same aggregate belongs to the same critical section; those
/// calls reuse it and release it when they finish.
///
/// A loaded aggregate that is never saved or reverted keeps its lock for the
/// provider's lifetime, and every other provider waiting on that key waits
/// with it. Call [`release`](Self::release) to give up a loaded aggregate.
///
/// The provider remembers which aggregates it has loaded or saved. A `save`
/// of an aggregate it has not seen inserts a new stream; any later `save`
/// appends to it.
pub struct AggregateAccessProvider<R, F: MutexFactory> {
    repository: R,
    locks: LockRegistry<F>,
    known: KnownAggregates,
}

impl<R, F> AggregateAccessProvider<R, F>
where
    R: EventStreamRepository,
    F: MutexFactory,
{
    pub fn new(repository: R, factory: F) -> Self {
        AggregateAccessProvider {
            repository,
            locks: LockRegistry::new(factory),
            known: KnownAggregates::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn mutex_factory(&self) -> &F {
        self.locks.factory()
    }

    /// Load an aggregate and keep its lock held until it is saved, reverted
    /// or released.
    pub async fn load(
        &self,
        id: &AggregateId,
    ) -> Result<Option<R::Aggregate>, AggregateAccessError> {
        let key = LockKey::aggregate(id);
        let held = self
            .locks
            .acquire(&key)
            .await
            .map_err(|e| AggregateAccessError::load_failed(id, e))?;

        match self.repository.load(id).await {
            Ok(Some(aggregate)) => {
                self.known.mark(id, R::Aggregate::type_name());
                held.keep();
                debug!(aggregate_id = %id, version = aggregate.version(), "aggregate loaded");
                Ok(Some(aggregate))
            }
            Ok(None) => {
                held.release_or_warn().await;
                trace!(aggregate_id = %id, "aggregate not found");
                Ok(None)
            }
            Err(err) => {
                held.release_or_warn().await;
                Err(AggregateAccessError::load_failed(id, err))
            }
        }
    }

    /// Persist the aggregate's new events, then hand each produced event to `target`.
    ///
    /// Returns the produced events once every delivery has finished.
    pub async fn save<D>(
        &self,
        aggregate: &mut R::Aggregate,
        target: &D,
    ) -> Result<Vec<R::Event>, AggregateAccessError>
    where
        D: DeliveryTarget<R::Event> + ?Sized,
    {
        let id = aggregate.aggregate_id();
        let key = LockKey::aggregate(&id);
        let held = self
            .locks
            .acquire(&key)
            .await
            .map_err(|e| AggregateAccessError::save_failed(&id, e))?;

        let insert = !self.known.contains(&id);
        let result = if insert {
            debug!(aggregate_id = %id, "inserting new event stream");
            self.repository.save(aggregate).await
        } else {
            debug!(aggregate_id = %id, "appending to event stream");
            self.repository.update(aggregate).await
        };

        if result.is_ok() {
            self.known.mark(&id, R::Aggregate::type_name());
        }
        held.release_or_warn().await;

        let events = match result {
            Ok(events) => events,
            Err(err) if insert && err.is_unique_violation() => {
                return Err(AggregateAccessError::DuplicateAggregate { id, source: err });
            }
            Err(err) => return Err(AggregateAccessError::save_failed(&id, err)),
        };

        debug!(aggregate_id = %id, count = events.len(), "delivering produced events");
        deliver_all(target, events.iter().cloned()).await;

        Ok(events)
    }

    /// Roll the aggregate back to `to_version`.
    pub async fn revert(
        &self,
        aggregate: R::Aggregate,
        to_version: u64,
        mode: RevertMode,
    ) -> Result<R::Aggregate, AggregateAccessError> {
        let id = aggregate.aggregate_id();
        let key = LockKey::aggregate(&id);
        let held = self
            .locks
            .acquire(&key)
            .await
            .map_err(|e| AggregateAccessError::revert_failed(&id, to_version, e))?;

        debug!(aggregate_id = %id, to_version, mode = %mode, "reverting aggregate");
        let result = self.repository.revert(aggregate, to_version, mode).await;
        held.release_or_warn().await;

        result.map_err(|err| AggregateAccessError::revert_failed(&id, to_version, err))
    }

    /// Give up the lock a previous `load` left held. No-op if none is held.
    pub async fn release(&self, id: &AggregateId) -> Result<(), LockError> {
        self.locks.release(&LockKey::aggregate(id)).await
    }

    /// Release every lock a `load` left held.
    pub async fn release_all(&self) -> Result<(), LockError> {
        self.locks.release_all().await
    }

    /// Whether this provider currently holds the aggregate's lock.
    pub fn holds_lock(&self, id: &AggregateId) -> bool {
        self.locks.is_held(&LockKey::aggregate(id))
    }

    pub fn is_known(&self, id: &AggregateId) -> bool {
        self.known.contains(id)
    }

    pub fn known_type(&self, id: &AggregateId) -> Option<&'static str> {
        self.known.type_of(id)
    }

    /// Number of aggregates this provider has loaded or saved. Never shrinks.
    pub fn known_len(&self) -> usize {
        self.known.len()
    }
}
