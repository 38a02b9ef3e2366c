use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use super::DeliveryTarget;
use crate::entity::EventRecord;

/// Writes one line per delivered event, to a buffer or to `tracing` at info level.
pub struct LogDelivery {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl Default for LogDelivery {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDelivery {
    pub fn new() -> Self {
        LogDelivery { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogDelivery {
            buffer: Some(buffer),
        }
    }
}

#[async_trait]
impl DeliveryTarget<EventRecord> for LogDelivery {
    async fn deliver(&self, event: EventRecord) {
        let aggregate_id = event.aggregate_id().unwrap_or("-");
        match &self.buffer {
            Some(buffer) => {
                let line = format!(
                    "[DELIVERY] {} {} #{}",
                    event.name(), aggregate_id, event.sequence()
                );
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(line);
            }
            None => info!(
                event = %event.name(),
                aggregate_id,
                sequence = event.sequence(),
                "event delivered"
            ),
        }
    }
}
