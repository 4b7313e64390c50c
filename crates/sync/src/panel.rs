use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use studyhall_core::{CollectionPath, Document, FieldMap, Record, Stored, ValidationError, to_fields};
use studyhall_gateway::{CollectionGateway, GatewayError, Subscription, SubscriptionEvent};

use crate::view::LiveView;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Lifecycle of one mounted panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Unmounted,
    /// Subscribed, no snapshot yet.
    Subscribing,
    Live,
}

/// What a processed subscription delivery amounted to.
#[derive(Debug, Clone)]
pub enum PanelChange {
    Snapshot,
    Error(GatewayError),
}

/// One feature's controller: binds a live view to a collection path and
/// translates intents into gateway calls.
///
/// Mutations are fire-and-forget from the view's perspective: the write goes
/// to the gateway and the result arrives through the next snapshot, never by
/// touching the local list directly. Unmounting unsubscribes unconditionally
/// and discards the view; writes still in flight complete against the
/// backend but have nothing local left to update.
pub struct Panel<T: Document, G: CollectionGateway> {
    gateway: G,
    path: CollectionPath,
    view: LiveView<T>,
    sub: Option<Subscription>,
    state: PanelState,
    last_error: Option<GatewayError>,
    mounted_at: Option<Instant>,
    last_snapshot_at: Option<Instant>,
}

impl<T: Document, G: CollectionGateway> Panel<T, G> {
    pub fn new(gateway: G, path: CollectionPath) -> Self {
        Self {
            gateway,
            path,
            view: LiveView::new(),
            sub: None,
            state: PanelState::Unmounted,
            last_error: None,
            mounted_at: None,
            last_snapshot_at: None,
        }
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Subscribe and start receiving snapshots. No-op when already mounted.
    pub fn mount(&mut self) {
        if self.sub.is_some() {
            return;
        }
        debug!(kind = T::KIND, path = %self.path, "panel mount");
        self.sub = Some(self.gateway.subscribe(&self.path));
        self.state = PanelState::Subscribing;
        self.last_error = None;
        self.mounted_at = Some(Instant::now());
        self.last_snapshot_at = None;
    }

    /// Unsubscribe and discard local state. Safe to call on every exit path,
    /// mounted or not.
    pub fn unmount(&mut self) {
        if let Some(mut sub) = self.sub.take() {
            sub.unsubscribe();
        }
        debug!(kind = T::KIND, path = %self.path, "panel unmount");
        self.state = PanelState::Unmounted;
        self.view.clear();
        self.mounted_at = None;
        self.last_snapshot_at = None;
    }

    fn apply(&mut self, event: SubscriptionEvent) -> PanelChange {
        match event {
            SubscriptionEvent::Snapshot(records) => {
                self.view.apply_snapshot(&records);
                self.state = PanelState::Live;
                self.last_snapshot_at = Some(Instant::now());
                PanelChange::Snapshot
            }
            SubscriptionEvent::Error(err) => {
                warn!(kind = T::KIND, path = %self.path, "subscription error: {err}");
                self.last_error = Some(err.clone());
                PanelChange::Error(err)
            }
        }
    }

    /// Await and apply the next delivery. `None` when unmounted or the
    /// subscription has closed.
    pub async fn next_change(&mut self) -> Option<PanelChange> {
        let event = self.sub.as_mut()?.next_event().await?;
        Some(self.apply(event))
    }

    /// Apply everything already queued without blocking. Returns the number
    /// of deliveries processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        loop {
            let event = match self.sub.as_mut() {
                Some(sub) => sub.try_event(),
                None => None,
            };
            let Some(event) = event else {
                return processed;
            };
            self.apply(event);
            processed += 1;
        }
    }

    /// Await the first snapshot after a mount. An error delivery (e.g.
    /// unauthorized) is returned instead of looping forever.
    pub async fn wait_live(&mut self) -> Result<(), GatewayError> {
        while self.state != PanelState::Live {
            match self.next_change().await {
                Some(PanelChange::Snapshot) => {}
                Some(PanelChange::Error(err)) => return Err(err),
                None => {
                    return Err(GatewayError::Unavailable {
                        reason: "subscription closed before first snapshot".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Items in display order; empty when unmounted.
    pub fn items(&self) -> &[Stored<T>] {
        self.view.items()
    }

    pub fn get(&self, id: &str) -> Option<&Stored<T>> {
        self.view.get(id)
    }

    /// Most recent subscription error, kept for display.
    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    /// True when mounted and no snapshot has arrived within `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match (self.last_snapshot_at, self.mounted_at) {
            (Some(at), _) => at.elapsed() > max_age,
            (None, Some(mounted)) => mounted.elapsed() > max_age,
            (None, None) => false,
        }
    }

    fn encode(data: &T) -> Result<FieldMap, PanelError> {
        data.validate()?;
        Ok(to_fields(data)?)
    }

    /// Validate and create a new document. The returned future owns
    /// everything it needs, so the panel may be unmounted while the write is
    /// in flight; the view only changes once the authoritative snapshot
    /// arrives.
    pub fn create(
        &self,
        data: &T,
    ) -> impl Future<Output = Result<Record, PanelError>> + Send + use<T, G> {
        let encoded = Self::encode(data);
        let gateway = self.gateway.clone();
        let path = self.path.clone();
        async move { Ok(gateway.create(&path, encoded?).await?) }
    }

    /// Merge a raw field patch into an existing record, last-write-wins per
    /// top-level field.
    pub fn update(
        &self,
        id: &str,
        patch: FieldMap,
    ) -> impl Future<Output = Result<(), PanelError>> + Send + use<T, G> {
        let gateway = self.gateway.clone();
        let path = self.path.clone();
        let id = id.to_string();
        async move { Ok(gateway.update(&path, &id, patch).await?) }
    }

    /// Validate and write a full replacement of the record's fields.
    pub fn set(
        &self,
        id: &str,
        data: &T,
    ) -> impl Future<Output = Result<(), PanelError>> + Send + use<T, G> {
        let encoded = Self::encode(data);
        let gateway = self.gateway.clone();
        let path = self.path.clone();
        let id = id.to_string();
        async move { Ok(gateway.update(&path, &id, encoded?).await?) }
    }

    pub fn delete(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), PanelError>> + Send + use<T, G> {
        let gateway = self.gateway.clone();
        let path = self.path.clone();
        let id = id.to_string();
        async move { Ok(gateway.delete(&path, &id).await?) }
    }
}
