use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use studyhall_core::{CollectionPath, FieldMap, Record};

use crate::CollectionGateway;
use crate::auth;
use crate::error::GatewayError;
use crate::store::{MonotonicClock, RecordStore, SubscriberSet, sort_snapshot};
use crate::sub::{Subscription, SubscriptionEvent};

/// Records held by one backend, keyed by canonical path string then id.
#[derive(Default)]
struct Collections(HashMap<String, BTreeMap<String, Record>>);

impl Collections {
    fn snapshot(&self, path_key: &str) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .0
            .get(path_key)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        sort_snapshot(&mut records);
        records
    }

    fn insert(&mut self, path_key: &str, record: Record) {
        self.0
            .entry(path_key.to_string())
            .or_default()
            .insert(record.id.clone(), record);
    }

    fn get_mut(&mut self, path_key: &str, id: &str) -> Option<&mut Record> {
        self.0.get_mut(path_key).and_then(|m| m.get_mut(id))
    }

    fn remove(&mut self, path_key: &str, id: &str) -> Option<Record> {
        self.0.get_mut(path_key).and_then(|m| m.remove(id))
    }
}

impl RecordStore for Collections {
    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Record>, GatewayError> {
        Ok(self
            .0
            .get(&path.to_string())
            .and_then(|m| m.get(id))
            .cloned())
    }

    fn list(&self, path: &CollectionPath) -> Result<Vec<Record>, GatewayError> {
        Ok(self.snapshot(&path.to_string()))
    }
}

struct StoreInner {
    records: Collections,
    subscribers: SubscriberSet,
    clock: MonotonicClock,
}

/// Process-local shared store. Cheap to clone; every clone sees the same
/// records and subscribers.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                records: Collections::default(),
                subscribers: SubscriberSet::default(),
                clock: MonotonicClock::new(None),
            })),
        }
    }

    /// Gateway acting as `actor` against this store.
    pub fn connect(&self, actor: impl Into<String>) -> MemoryGateway {
        MemoryGateway {
            inner: Arc::clone(&self.inner),
            actor: actor.into(),
        }
    }
}

/// In-memory gateway bound to one acting identity.
#[derive(Clone)]
pub struct MemoryGateway {
    inner: Arc<Mutex<StoreInner>>,
    actor: String,
}

impl MemoryGateway {
    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

impl CollectionGateway for MemoryGateway {
    fn actor(&self) -> &str {
        &self.actor
    }

    fn subscribe(&self, path: &CollectionPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        if let Err(err) = auth::check_read(&inner.records, &self.actor, path) {
            debug!(actor = %self.actor, path = %path, "subscribe rejected");
            let _ = tx.send(SubscriptionEvent::Error(err));
            return Subscription::detached(rx);
        }

        let path_key = path.to_string();
        let snapshot = inner.records.snapshot(&path_key);
        let _ = tx.send(SubscriptionEvent::Snapshot(snapshot));
        let id = inner.subscribers.register(path_key, tx);
        drop(inner);

        // The canceller must not keep the store alive on its own.
        let weak: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);
        Subscription::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().expect("memory store mutex poisoned");
                inner.subscribers.remove(id);
            }
        })
    }

    async fn create(
        &self,
        path: &CollectionPath,
        fields: FieldMap,
    ) -> Result<Record, GatewayError> {
        let mut inner = self.lock();
        auth::check_create(&inner.records, &self.actor, path, &fields)?;

        let record = Record::new(Uuid::new_v4().to_string(), inner.clock.next(), fields);
        let path_key = path.to_string();
        inner.records.insert(&path_key, record.clone());

        let inner = &mut *inner;
        let snapshot = inner.records.snapshot(&path_key);
        inner.subscribers.fan_out(&path_key, &snapshot);
        Ok(record)
    }

    async fn update(
        &self,
        path: &CollectionPath,
        id: &str,
        patch: FieldMap,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        let path_key = path.to_string();

        let existing = inner
            .records
            .get(path, id)?
            .ok_or_else(|| GatewayError::not_found(path, id))?;
        auth::check_mutate(&inner.records, &self.actor, path, &existing)?;

        inner
            .records
            .get_mut(&path_key, id)
            .expect("record checked above")
            .merge_fields(patch);

        let inner = &mut *inner;
        let snapshot = inner.records.snapshot(&path_key);
        inner.subscribers.fan_out(&path_key, &snapshot);
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        let path_key = path.to_string();

        let Some(existing) = inner.records.get(path, id)? else {
            return Ok(());
        };
        auth::check_mutate(&inner.records, &self.actor, path, &existing)?;
        inner.records.remove(&path_key, id);

        let inner = &mut *inner;
        let snapshot = inner.records.snapshot(&path_key);
        inner.subscribers.fan_out(&path_key, &snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        let serde_json::Value::Object(map) = value else {
            panic!("fields must be an object");
        };
        map
    }

    fn snapshot(sub: &mut Subscription) -> Vec<Record> {
        match sub.try_event() {
            Some(SubscriptionEvent::Snapshot(records)) => records,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    fn error(sub: &mut Subscription) -> GatewayError {
        match sub.try_event() {
            Some(SubscriptionEvent::Error(err)) => err,
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_monotonic_created_at() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");

        let a = gw
            .create(&path, fields(json!({"title": "a"})))
            .await
            .unwrap();
        let b = gw
            .create(&path, fields(json!({"title": "b"})))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.created_at < b.created_at);
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_then_updated_snapshots() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");

        let mut sub = gw.subscribe(&path);
        assert!(snapshot(&mut sub).is_empty());

        let created = gw
            .create(&path, fields(json!({"title": "Read Ch.5"})))
            .await
            .unwrap();
        let records = snapshot(&mut sub);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].fields["title"], json!("Read Ch.5"));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_stops_delivery() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");

        let mut sub = gw.subscribe(&path);
        let _ = snapshot(&mut sub);

        sub.unsubscribe();
        sub.unsubscribe(); // second call: no effect, no panic
        assert!(sub.is_closed());

        gw.create(&path, fields(json!({"title": "x"}))).await.unwrap();
        assert!(sub.try_event().is_none());
    }

    #[tokio::test]
    async fn foreign_user_paths_error_through_the_channel() {
        let backend = MemoryBackend::new();
        let alice = backend.connect("alice");
        let bob = backend.connect("bob");

        alice
            .create(
                &CollectionPath::tasks("alice"),
                fields(json!({"title": "private"})),
            )
            .await
            .unwrap();

        let mut sub = bob.subscribe(&CollectionPath::tasks("alice"));
        assert!(matches!(
            error(&mut sub),
            GatewayError::Unauthorized { .. }
        ));

        // Bob's own collection is unaffected.
        let mut own = bob.subscribe(&CollectionPath::tasks("bob"));
        assert!(snapshot(&mut own).is_empty());

        assert!(
            bob.create(
                &CollectionPath::tasks("alice"),
                fields(json!({"title": "smuggled"}))
            )
            .await
            .is_err()
        );
    }

    #[tokio::test]
    async fn room_subcollections_require_membership() {
        let backend = MemoryBackend::new();
        let owner = backend.connect("owner");
        let guest = backend.connect("guest");

        let room = owner
            .create(
                &CollectionPath::study_rooms(),
                fields(json!({"name": "Calculus", "owner_id": "owner"})),
            )
            .await
            .unwrap();
        let messages = CollectionPath::room_messages(&room.id);
        let members = CollectionPath::room_members(&room.id);

        // Not yet a member: read and send both refused.
        let mut sub = guest.subscribe(&messages);
        assert!(matches!(error(&mut sub), GatewayError::Unauthorized { .. }));
        assert!(
            guest
                .create(
                    &messages,
                    fields(json!({"text": "hi", "sender_id": "guest"}))
                )
                .await
                .is_err()
        );

        // Join, then both work.
        guest
            .create(&members, fields(json!({"user_id": "guest"})))
            .await
            .unwrap();
        let mut sub = guest.subscribe(&messages);
        assert!(snapshot(&mut sub).is_empty());
        guest
            .create(
                &messages,
                fields(json!({"text": "hi", "sender_id": "guest"})),
            )
            .await
            .unwrap();
        assert_eq!(snapshot(&mut sub).len(), 1);

        // Authorship cannot be forged.
        assert!(
            guest
                .create(
                    &messages,
                    fields(json!({"text": "fake", "sender_id": "owner"}))
                )
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn joining_a_missing_room_reports_not_found() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let err = gw
            .create(
                &CollectionPath::room_members("nope"),
                fields(json!({"user_id": "u1"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_merges_fields_and_missing_records_error() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");

        let record = gw
            .create(
                &path,
                fields(json!({"title": "Read Ch.5", "completed": false})),
            )
            .await
            .unwrap();

        gw.update(&path, &record.id, fields(json!({"completed": true})))
            .await
            .unwrap();
        let stored = gw.lock().records.get(&path, &record.id).unwrap().unwrap();
        assert_eq!(stored.fields["completed"], json!(true));
        assert_eq!(stored.fields["title"], json!("Read Ch.5"));

        let err = gw
            .update(&path, "missing", fields(json!({"completed": true})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_is_a_noop_for_absent_records() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");
        gw.delete(&path, "never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn owner_may_remove_any_member_but_members_only_themselves() {
        let backend = MemoryBackend::new();
        let owner = backend.connect("owner");
        let a = backend.connect("a");
        let b = backend.connect("b");

        let room = owner
            .create(
                &CollectionPath::study_rooms(),
                fields(json!({"name": "r", "owner_id": "owner"})),
            )
            .await
            .unwrap();
        let members = CollectionPath::room_members(&room.id);
        let ma = a
            .create(&members, fields(json!({"user_id": "a"})))
            .await
            .unwrap();
        let mb = b
            .create(&members, fields(json!({"user_id": "b"})))
            .await
            .unwrap();

        // A member cannot kick another member.
        assert!(a.delete(&members, &mb.id).await.is_err());
        // Leaving is always allowed; the owner may remove anyone.
        a.delete(&members, &ma.id).await.unwrap();
        owner.delete(&members, &mb.id).await.unwrap();
    }

    #[tokio::test]
    async fn two_subscriptions_on_one_path_both_receive() {
        let backend = MemoryBackend::new();
        let gw = backend.connect("u1");
        let path = CollectionPath::tasks("u1");

        let mut first = gw.subscribe(&path);
        let mut second = gw.subscribe(&path);
        let _ = snapshot(&mut first);
        let _ = snapshot(&mut second);

        gw.create(&path, fields(json!({"title": "shared"})))
            .await
            .unwrap();
        assert_eq!(snapshot(&mut first).len(), 1);
        assert_eq!(snapshot(&mut second).len(), 1);
    }
}
