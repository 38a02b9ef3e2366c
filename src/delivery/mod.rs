//! Targets that receive the events produced by a successful save.

mod collecting;
#[cfg(feature = "emitter")]
mod emitter;
mod log;
mod target;

pub use collecting::CollectingDelivery;
#[cfg(feature = "emitter")]
pub use emitter::EmitterDelivery;
pub use log::LogDelivery;
pub use target::{deliver_all, DeliveryTarget};
