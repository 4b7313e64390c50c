use std::path::Path;
use std::sync::{Arc, Mutex, Weak};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use studyhall_core::{CollectionPath, FieldMap, Record};

use crate::CollectionGateway;
use crate::auth;
use crate::error::GatewayError;
use crate::store::{MonotonicClock, RecordStore, SubscriberSet, sort_snapshot};
use crate::sub::{Subscription, SubscriptionEvent};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    path        TEXT NOT NULL,
    id          TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    fields      TEXT NOT NULL,
    PRIMARY KEY (path, id)
);
CREATE INDEX IF NOT EXISTS idx_records_path_created ON records(path, created_at);
";

fn db_err(e: rusqlite::Error) -> GatewayError {
    GatewayError::Unavailable {
        reason: e.to_string(),
    }
}

fn encode_timestamp(at: DateTime<Utc>) -> String {
    // Fixed-width form so textual ordering matches chronological ordering.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a raw row, skipping rows that no longer parse (hand-edited or
/// corrupted databases) instead of failing the whole snapshot.
fn decode_row(id: String, created_at: String, fields: String) -> Option<Record> {
    let created_at = match DateTime::parse_from_rfc3339(&created_at) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            warn!(%id, %created_at, "skipping record with bad timestamp: {e}");
            return None;
        }
    };
    let fields: FieldMap = match serde_json::from_str(&fields) {
        Ok(f) => f,
        Err(e) => {
            warn!(%id, "skipping record with bad fields: {e}");
            return None;
        }
    };
    Some(Record::new(id, created_at, fields))
}

impl RecordStore for Connection {
    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Record>, GatewayError> {
        let row: Option<(String, String, String)> = self
            .query_row(
                "SELECT id, created_at, fields FROM records WHERE path = ?1 AND id = ?2",
                params![path.to_string(), id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(db_err)?;
        Ok(row.and_then(|(id, created_at, fields)| decode_row(id, created_at, fields)))
    }

    fn list(&self, path: &CollectionPath) -> Result<Vec<Record>, GatewayError> {
        let mut stmt = self
            .prepare(
                "SELECT id, created_at, fields FROM records WHERE path = ?1 \
                 ORDER BY created_at, id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![path.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, created_at, fields): (String, String, String) = row.map_err(db_err)?;
            if let Some(record) = decode_row(id, created_at, fields) {
                records.push(record);
            }
        }
        sort_snapshot(&mut records);
        Ok(records)
    }
}

struct SqliteInner {
    conn: Connection,
    subscribers: SubscriberSet,
    clock: MonotonicClock,
}

impl SqliteInner {
    fn snapshot(&self, path: &CollectionPath) -> Result<Vec<Record>, GatewayError> {
        self.conn.list(path)
    }
}

/// SQLite-backed store with in-process subscriptions, shared by every
/// gateway connected from it.
#[derive(Clone)]
pub struct SqliteBackend {
    inner: Arc<Mutex<SqliteInner>>,
}

impl SqliteBackend {
    /// Open (or create) the store at `path`, enabling WAL and running the
    /// schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir for {}", path.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Ephemeral store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("initializing records schema")?;

        // Resume the creation clock past anything already stored.
        let max_created: Option<String> = conn
            .query_row("SELECT MAX(created_at) FROM records", [], |row| row.get(0))
            .context("reading max created_at")?;
        let last_seen = max_created
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(Self {
            inner: Arc::new(Mutex::new(SqliteInner {
                conn,
                subscribers: SubscriberSet::default(),
                clock: MonotonicClock::new(last_seen),
            })),
        })
    }

    /// Gateway acting as `actor` against this store.
    pub fn connect(&self, actor: impl Into<String>) -> SqliteGateway {
        SqliteGateway {
            inner: Arc::clone(&self.inner),
            actor: actor.into(),
        }
    }
}

/// SQLite gateway bound to one acting identity.
#[derive(Clone)]
pub struct SqliteGateway {
    inner: Arc<Mutex<SqliteInner>>,
    actor: String,
}

impl SqliteGateway {
    fn lock(&self) -> std::sync::MutexGuard<'_, SqliteInner> {
        self.inner.lock().expect("sqlite store mutex poisoned")
    }

    fn fan_out(inner: &mut SqliteInner, path: &CollectionPath) -> Result<(), GatewayError> {
        let snapshot = inner.snapshot(path)?;
        inner.subscribers.fan_out(&path.to_string(), &snapshot);
        Ok(())
    }
}

impl CollectionGateway for SqliteGateway {
    fn actor(&self) -> &str {
        &self.actor
    }

    fn subscribe(&self, path: &CollectionPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        let initial = auth::check_read(&inner.conn, &self.actor, path)
            .and_then(|()| inner.snapshot(path));
        let snapshot = match initial {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(actor = %self.actor, path = %path, "subscribe rejected: {err}");
                let _ = tx.send(SubscriptionEvent::Error(err));
                return Subscription::detached(rx);
            }
        };

        let _ = tx.send(SubscriptionEvent::Snapshot(snapshot));
        let id = inner.subscribers.register(path.to_string(), tx);
        drop(inner);

        let weak: Weak<Mutex<SqliteInner>> = Arc::downgrade(&self.inner);
        Subscription::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().expect("sqlite store mutex poisoned");
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
        auth::check_create(&inner.conn, &self.actor, path, &fields)?;

        let record = Record::new(Uuid::new_v4().to_string(), inner.clock.next(), fields);
        inner
            .conn
            .execute(
                "INSERT INTO records (path, id, created_at, fields) VALUES (?1, ?2, ?3, ?4)",
                params![
                    path.to_string(),
                    record.id,
                    encode_timestamp(record.created_at),
                    serde_json::Value::Object(record.fields.clone()).to_string(),
                ],
            )
            .map_err(db_err)?;

        Self::fan_out(&mut inner, path)?;
        Ok(record)
    }

    async fn update(
        &self,
        path: &CollectionPath,
        id: &str,
        patch: FieldMap,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();

        let mut existing = inner
            .conn
            .get(path, id)?
            .ok_or_else(|| GatewayError::not_found(path, id))?;
        auth::check_mutate(&inner.conn, &self.actor, path, &existing)?;

        existing.merge_fields(patch);
        inner
            .conn
            .execute(
                "UPDATE records SET fields = ?1 WHERE path = ?2 AND id = ?3",
                params![
                    serde_json::Value::Object(existing.fields).to_string(),
                    path.to_string(),
                    id,
                ],
            )
            .map_err(db_err)?;

        Self::fan_out(&mut inner, path)?;
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), GatewayError> {
        let mut inner = self.lock();

        let Some(existing) = inner.conn.get(path, id)? else {
            return Ok(());
        };
        auth::check_mutate(&inner.conn, &self.actor, path, &existing)?;
        inner
            .conn
            .execute(
                "DELETE FROM records WHERE path = ?1 AND id = ?2",
                params![path.to_string(), id],
            )
            .map_err(db_err)?;

        Self::fan_out(&mut inner, path)?;
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

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("studyhall.db");
        let path = CollectionPath::tasks("u1");

        let created = {
            let backend = SqliteBackend::open(&db_path).unwrap();
            let gw = backend.connect("u1");
            gw.create(&path, fields(json!({"title": "persisted"})))
                .await
                .unwrap()
        };

        let backend = SqliteBackend::open(&db_path).unwrap();
        let gw = backend.connect("u1");
        let mut sub = gw.subscribe(&path);
        let records = snapshot(&mut sub);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].created_at, created.created_at);

        // The creation clock resumes past persisted records.
        let later = gw
            .create(&path, fields(json!({"title": "newer"})))
            .await
            .unwrap();
        assert!(later.created_at > created.created_at);
    }

    #[tokio::test]
    async fn subscriptions_track_writes() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let gw = backend.connect("u1");
        let path = CollectionPath::notes("u1");

        let mut sub = gw.subscribe(&path);
        assert!(snapshot(&mut sub).is_empty());

        let record = gw
            .create(&path, fields(json!({"title": "n1", "body": ""})))
            .await
            .unwrap();
        assert_eq!(snapshot(&mut sub).len(), 1);

        gw.update(&path, &record.id, fields(json!({"body": "updated"})))
            .await
            .unwrap();
        let records = snapshot(&mut sub);
        assert_eq!(records[0].fields["body"], json!("updated"));

        gw.delete(&path, &record.id).await.unwrap();
        assert!(snapshot(&mut sub).is_empty());
    }

    #[tokio::test]
    async fn scoping_matches_the_memory_backend() {
        let backend = SqliteBackend::open_in_memory().unwrap();
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
            sub.try_event(),
            Some(SubscriptionEvent::Error(GatewayError::Unauthorized { .. }))
        ));
    }

    #[tokio::test]
    async fn membership_gates_room_messages() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let owner = backend.connect("owner");
        let guest = backend.connect("guest");

        let room = owner
            .create(
                &CollectionPath::study_rooms(),
                fields(json!({"name": "Physics Lab", "owner_id": "owner"})),
            )
            .await
            .unwrap();
        let messages = CollectionPath::room_messages(&room.id);

        assert!(
            guest
                .create(
                    &messages,
                    fields(json!({"text": "hi", "sender_id": "guest"}))
                )
                .await
                .is_err()
        );

        guest
            .create(
                &CollectionPath::room_members(&room.id),
                fields(json!({"user_id": "guest"})),
            )
            .await
            .unwrap();
        guest
            .create(
                &messages,
                fields(json!({"text": "hi", "sender_id": "guest"})),
            )
            .await
            .unwrap();
    }
}
