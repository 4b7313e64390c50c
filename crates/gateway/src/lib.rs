//! Collection gateway: create/update/delete/subscribe against named
//! collections of records, scoped by owner.
//!
//! The contract is backend-agnostic; this crate ships the in-memory backend
//! (reference implementation and test double) and a SQLite-backed one for
//! durable local data. Both deliver full snapshots, never diffs, and both
//! surface authorization failures through the subscription's error channel
//! rather than by failing `subscribe` itself.

mod auth;
mod error;
mod memory;
mod sqlite;
mod store;
mod sub;

pub use error::GatewayError;
pub use memory::{MemoryBackend, MemoryGateway};
pub use sqlite::{SqliteBackend, SqliteGateway};
pub use sub::{Subscription, SubscriptionEvent};

use studyhall_core::{CollectionPath, FieldMap, Record};

/// Async gateway to one backend, bound to a single acting identity.
///
/// Writes resolve against the backend even if the issuing panel has been
/// unmounted in the meantime; cancellation is a subscription-side concern
/// only. `subscribe` never fails synchronously.
pub trait CollectionGateway: Clone + Send + Sync + 'static {
    /// Uid of the identity this gateway acts as.
    fn actor(&self) -> &str;

    /// Register a push listener on `path`. The current snapshot is delivered
    /// immediately; every server-visible change delivers a fresh full
    /// snapshot. Unauthorized paths deliver a single error event instead.
    fn subscribe(&self, path: &CollectionPath) -> Subscription;

    /// Create a record; the backend assigns `id` and `created_at`. The id
    /// must not be assumed to exist before the future resolves.
    ///
    /// Declared as `impl Future + Send` (rather than `async fn`) so callers
    /// generic over the gateway can hold the future across suspension
    /// points.
    fn create(
        &self,
        path: &CollectionPath,
        fields: FieldMap,
    ) -> impl Future<Output = Result<Record, GatewayError>> + Send;

    /// Merge `patch` into an existing record, last-write-wins per top-level
    /// field. No compare-and-swap semantics.
    fn update(
        &self,
        path: &CollectionPath,
        id: &str,
        patch: FieldMap,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Delete a record. Deleting an already-absent record is a no-op.
    fn delete(
        &self,
        path: &CollectionPath,
        id: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
