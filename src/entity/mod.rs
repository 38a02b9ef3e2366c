mod entity;
mod event_record;

pub use entity::Entity;
pub use event_record::{EventRecord, Payload, PayloadError, AGGREGATE_ID_META};
