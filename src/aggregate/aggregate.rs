use std::fmt;

use super::AggregateId;
use crate::entity::{Entity, EventRecord};
use crate::error::RepositoryError;

/// Trait for domain aggregates that can be event-sourced.
///
/// Providers only look at an aggregate's identity and concrete type; the
/// entity and replay hooks exist for repositories that rebuild aggregates
/// from their event history.
pub trait Aggregate: Sized + Default + Send + Sync {
    type ReplayError: fmt::Display;

    fn new_empty() -> Self {
        Self::default()
    }
    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;
    fn replay_event(&mut self, event: &EventRecord) -> Result<(), Self::ReplayError>;

    fn aggregate_id(&self) -> AggregateId {
        AggregateId::from(self.entity().id())
    }

    fn version(&self) -> u64 {
        self.entity().version()
    }

    /// Concrete type name, recorded by providers for every known aggregate.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Implement [`Aggregate`] for a struct that keeps its [`Entity`] in a field
/// and replays events through one of its own methods.
///
/// `impl_aggregate!(Account { entity, replay })` reports replay failures as
/// `String`; `impl_aggregate!(Account { entity, replay } -> AccountError)`
/// names another error type.
#[macro_export]
macro_rules! impl_aggregate {
    ($ty:ty { $field:ident, $replay:ident }) => {
        $crate::impl_aggregate!($ty { $field, $replay } -> ::std::string::String);
    };
    ($ty:ty { $field:ident, $replay:ident } -> $err:ty) => {
        impl $crate::Aggregate for $ty {
            type ReplayError = $err;

            fn entity(&self) -> &$crate::Entity {
                &self.$field
            }

            fn entity_mut(&mut self) -> &mut $crate::Entity {
                &mut self.$field
            }

            fn replay_event(&mut self, event: &$crate::EventRecord) -> ::std::result::Result<(), $err> {
                <$ty>::$replay(self, event)
            }
        }
    };
}

/// Rebuild an aggregate from `entity` by replaying its history.
///
/// The entity records nothing while its events are replayed.
pub fn hydrate<A: Aggregate>(entity: Entity) -> Result<A, RepositoryError> {
    let history: Vec<EventRecord> = entity.history().cloned().collect();

    let mut aggregate = A::new_empty();
    *aggregate.entity_mut() = entity;

    aggregate.entity_mut().set_replaying(true);
    let replayed = history
        .iter()
        .try_for_each(|event| aggregate.replay_event(event));
    aggregate.entity_mut().set_replaying(false);

    replayed.map_err(|err| RepositoryError::Replay(err.to_string()))?;
    Ok(aggregate)
}
