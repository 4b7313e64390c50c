use std::fmt;

use tokio::sync::mpsc;

use studyhall_core::Record;

use crate::error::GatewayError;

/// Push delivery for one subscription.
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    /// Full current snapshot of the subscribed collection, in server order.
    Snapshot(Vec<Record>),
    /// Failure on the subscription's error channel (e.g. unauthorized path).
    Error(GatewayError),
}

/// Handle to an active subscription, owned by the panel that created it.
///
/// Dropping the handle unsubscribes; calling [`Subscription::unsubscribe`]
/// explicitly is idempotent and safe on an already-closed handle.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<SubscriptionEvent>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never registered with the backend (its only
    /// traffic is whatever was pre-loaded into the channel, typically one
    /// error event).
    pub(crate) fn detached(events: mpsc::UnboundedReceiver<SubscriptionEvent>) -> Self {
        Self {
            events,
            cancel: None,
        }
    }

    /// Await the next delivery. `None` once the subscription is closed and
    /// drained.
    pub async fn next_event(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Non-blocking drain step for pump-style callers.
    pub fn try_event(&mut self) -> Option<SubscriptionEvent> {
        self.events.try_recv().ok()
    }

    /// Deregister from the backend. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether `unsubscribe` has already run (or was never needed).
    pub fn is_closed(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
