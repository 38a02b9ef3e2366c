use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

/// Receives events produced by a save, one call per event.
///
/// Delivery is fire-and-settle from the provider's point of view: a target
/// that can fail is responsible for its own retries and reporting.
#[async_trait]
pub trait DeliveryTarget<E: Send + 'static>: Send + Sync {
    async fn deliver(&self, event: E);
}

#[async_trait]
impl<E: Send + 'static> DeliveryTarget<E> for () {
    async fn deliver(&self, _event: E) {}
}

#[async_trait]
impl<E, T> DeliveryTarget<E> for Arc<T>
where
    E: Send + 'static,
    T: DeliveryTarget<E> + ?Sized,
{
    async fn deliver(&self, event: E) {
        (**self).deliver(event).await
    }
}

/// Deliver every event concurrently; returns once all deliveries have finished.
pub async fn deliver_all<E, D>(target: &D, events: impl IntoIterator<Item = E>)
where
    E: Send + 'static,
    D: DeliveryTarget<E> + ?Sized,
{
    join_all(events.into_iter().map(|event| target.deliver(event))).await;
}
