mod aggregate;
mod error;
mod id;
mod in_memory;
mod known;
mod provider;
mod repository;

pub use aggregate::{hydrate, Aggregate};
pub use error::AggregateAccessError;
pub use id::AggregateId;
pub use in_memory::InMemoryEventStreamRepository;
pub use known::KnownAggregates;
pub use provider::AggregateAccessProvider;
pub use repository::{EventStreamRepository, RevertMode, UnknownRevertMode};
