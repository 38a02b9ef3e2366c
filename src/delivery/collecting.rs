use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::DeliveryTarget;

/// Keeps every delivered event in a shared buffer. Clones share the buffer.
#[derive(Debug)]
pub struct CollectingDelivery<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E> Clone for CollectingDelivery<E> {
    fn clone(&self) -> Self {
        CollectingDelivery {
            events: Arc::clone(&self.events),
        }
    }
}

impl<E> Default for CollectingDelivery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> CollectingDelivery<E> {
    pub fn new() -> Self {
        CollectingDelivery {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything delivered so far.
    pub fn drain(&self) -> Vec<E> {
        self.buffer().drain(..).collect()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<E>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Clone> CollectingDelivery<E> {
    pub fn events(&self) -> Vec<E> {
        self.buffer().clone()
    }
}

#[async_trait]
impl<E: Send + 'static> DeliveryTarget<E> for CollectingDelivery<E> {
    async fn deliver(&self, event: E) {
        self.buffer().push(event);
    }
}
