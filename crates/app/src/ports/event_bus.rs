//! Event bus port — publish/subscribe for pipeline events.

use std::future::Future;

use autohome_domain::error::AutoHomeError;
use autohome_domain::event::Event;

/// Publishes pipeline events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), AutoHomeError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), AutoHomeError>> + Send {
        (**self).publish(event)
    }
}
