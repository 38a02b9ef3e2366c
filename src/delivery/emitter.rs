use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use event_emitter_rs::EventEmitter;
use tracing::warn;

use super::DeliveryTarget;
use crate::entity::EventRecord;

/// Emits delivered events on an in-process `EventEmitter`.
///
/// The event name is the emitter topic; listeners receive the record as JSON.
pub struct EmitterDelivery {
    emitter: Mutex<EventEmitter>,
}

impl EmitterDelivery {
    pub fn new(emitter: EventEmitter) -> Self {
        EmitterDelivery {
            emitter: Mutex::new(emitter),
        }
    }

    /// Register a listener for an event name.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on(event, listener);
    }
}

impl Default for EmitterDelivery {
    fn default() -> Self {
        Self::new(EventEmitter::new())
    }
}

#[async_trait]
impl DeliveryTarget<EventRecord> for EmitterDelivery {
    async fn deliver(&self, event: EventRecord) {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(err) => {
                warn!(event = %event.name(), error = %err, "cannot encode event for emitter");
                return;
            }
        };

        self.emitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(event.name(), json);
    }
}
