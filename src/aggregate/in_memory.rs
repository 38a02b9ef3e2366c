use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{hydrate, Aggregate, AggregateId, EventStreamRepository, RevertMode};
use crate::entity::{Entity, EventRecord, AGGREGATE_ID_META};
use crate::error::RepositoryError;

#[derive(Clone)]
struct StoredEvent {
    record: EventRecord,
    deleted: bool,
}

type Streams = HashMap<String, Vec<StoredEvent>>;

/// Event stream repository backed by a `HashMap<String, Vec<EventRecord>>`.
///
/// Streams are keyed by aggregate id. `save` refuses ids that already have a
/// stream, `update` checks the aggregate's committed version against the
/// stream before appending, and soft-deleted events stay stored but are
/// skipped when loading. Clones share the same storage.
pub struct InMemoryEventStreamRepository<A> {
    streams: Arc<RwLock<Streams>>,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for InMemoryEventStreamRepository<A> {
    fn clone(&self) -> Self {
        InMemoryEventStreamRepository {
            streams: Arc::clone(&self.streams),
            _marker: PhantomData,
        }
    }
}

impl<A> Default for InMemoryEventStreamRepository<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> InMemoryEventStreamRepository<A> {
    pub fn new() -> Self {
        InMemoryEventStreamRepository {
            streams: Arc::new(RwLock::new(HashMap::new())),
            _marker: PhantomData,
        }
    }

    /// Events of `id` that still replay, in order.
    pub fn events(&self, id: &str) -> Result<Vec<EventRecord>, RepositoryError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        Ok(streams.get(id).map(|stream| live(stream)).unwrap_or_default())
    }

    /// Events of `id` flagged deleted by a soft revert.
    pub fn deleted_events(&self, id: &str) -> Result<Vec<EventRecord>, RepositoryError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        Ok(streams
            .get(id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|stored| stored.deleted)
                    .map(|stored| stored.record.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn stream_count(&self) -> usize {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn live(stream: &[StoredEvent]) -> Vec<EventRecord> {
    stream
        .iter()
        .filter(|stored| !stored.deleted)
        .map(|stored| stored.record.clone())
        .collect()
}

fn live_version(stream: &[StoredEvent]) -> u64 {
    stream.iter().filter(|stored| !stored.deleted).count() as u64
}

/// Stamp the entity's new events with its id, append them to `stream` and
/// mark the entity committed.
fn append(stream: &mut Vec<StoredEvent>, entity: &mut Entity) -> Vec<EventRecord> {
    let produced: Vec<EventRecord> = entity
        .pending()
        .iter()
        .map(|event| event.clone().with_meta(AGGREGATE_ID_META, entity.id()))
        .collect();

    stream.extend(produced.iter().cloned().map(|record| StoredEvent {
        record,
        deleted: false,
    }));
    entity.commit();
    produced
}

fn rebuild<A: Aggregate>(id: &str, stream: &[StoredEvent]) -> Result<A, RepositoryError> {
    let mut entity = Entity::with_id(id);
    entity.restore(live(stream));
    hydrate::<A>(entity)
}

#[async_trait]
impl<A: Aggregate + 'static> EventStreamRepository for InMemoryEventStreamRepository<A> {
    type Aggregate = A;
    type Event = EventRecord;

    async fn load(&self, id: &AggregateId) -> Result<Option<A>, RepositoryError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;

        match streams.get(id.as_str()) {
            Some(stream) if live_version(stream) > 0 => Ok(Some(rebuild(id.as_str(), stream)?)),
            _ => Ok(None),
        }
    }

    async fn save(&self, aggregate: &mut A) -> Result<Vec<EventRecord>, RepositoryError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?;

        let id = aggregate.entity().id().to_string();
        if streams.contains_key(&id) {
            return Err(RepositoryError::UniqueViolation { key: id });
        }

        let stream = streams.entry(id).or_default();
        Ok(append(stream, aggregate.entity_mut()))
    }

    async fn update(&self, aggregate: &mut A) -> Result<Vec<EventRecord>, RepositoryError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?;

        let entity = aggregate.entity_mut();
        let Some(stream) = streams.get_mut(entity.id()) else {
            return Err(RepositoryError::NotFound {
                id: entity.id().to_string(),
            });
        };

        let actual = live_version(stream);
        if actual != entity.committed_version() {
            return Err(RepositoryError::ConcurrentWrite {
                id: entity.id().to_string(),
                expected: entity.committed_version(),
                actual,
            });
        }

        Ok(append(stream, entity))
    }

    async fn revert(
        &self,
        aggregate: A,
        to_version: u64,
        mode: RevertMode,
    ) -> Result<A, RepositoryError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?;

        let id = aggregate.entity().id().to_string();
        let Some(stream) = streams.get_mut(&id) else {
            return Err(RepositoryError::NotFound { id });
        };

        let current = live_version(stream);
        if aggregate.entity().committed_version() != current {
            return Err(RepositoryError::ConcurrentWrite {
                id,
                expected: aggregate.entity().committed_version(),
                actual: current,
            });
        }
        if to_version > current {
            return Err(RepositoryError::InvalidRevert {
                id,
                target: to_version,
                current,
            });
        }
        if to_version == current {
            return Ok(aggregate);
        }

        let mut seen = 0u64;
        match mode {
            RevertMode::SoftDelete => {
                for stored in stream.iter_mut().filter(|stored| !stored.deleted) {
                    seen += 1;
                    if seen > to_version {
                        stored.deleted = true;
                    }
                }
            }
            RevertMode::Delete => stream.retain(|stored| {
                if stored.deleted {
                    return true;
                }
                seen += 1;
                seen <= to_version
            }),
        }

        rebuild(&id, stream)
    }
}
