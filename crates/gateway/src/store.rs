//! Plumbing shared by the in-memory and SQLite backends: the snapshot
//! fan-out set and the monotonic creation clock.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;

use studyhall_core::{CollectionPath, Record};

use crate::error::GatewayError;
use crate::sub::SubscriptionEvent;

/// Read access to stored records, used by the authorization rules.
pub(crate) trait RecordStore {
    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Record>, GatewayError>;
    fn list(&self, path: &CollectionPath) -> Result<Vec<Record>, GatewayError>;
}

struct Subscriber {
    id: u64,
    path_key: String,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

/// Registered listeners, keyed by canonical path string. Fan-out is
/// per-subscriber with no deduplication: two listeners on the same path each
/// get their own copy of every snapshot.
#[derive(Default)]
pub(crate) struct SubscriberSet {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl SubscriberSet {
    pub(crate) fn register(
        &mut self,
        path_key: String,
        tx: mpsc::UnboundedSender<SubscriptionEvent>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, path_key, tx });
        id
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.subscribers.retain(|s| s.id != id);
    }

    /// Deliver a snapshot to every listener of `path_key`, pruning listeners
    /// whose receiving end is gone.
    pub(crate) fn fan_out(&mut self, path_key: &str, snapshot: &[Record]) {
        self.subscribers.retain(|sub| {
            if sub.path_key != path_key {
                return true;
            }
            sub.tx
                .send(SubscriptionEvent::Snapshot(snapshot.to_vec()))
                .is_ok()
        });
    }
}

/// Assigns strictly increasing `created_at` timestamps even when the wall
/// clock does not move between two creates.
///
/// Timestamps are truncated to microseconds, the precision the SQLite
/// backend persists, so a record reads back byte-identical after a reopen.
pub(crate) struct MonotonicClock {
    last: DateTime<Utc>,
}

fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    let extra_nanos = at.timestamp_subsec_nanos() % 1_000;
    at - Duration::nanoseconds(i64::from(extra_nanos))
}

impl MonotonicClock {
    pub(crate) fn new(last_seen: Option<DateTime<Utc>>) -> Self {
        Self {
            last: last_seen.unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub(crate) fn next(&mut self) -> DateTime<Utc> {
        let now = truncate_to_micros(Utc::now());
        let assigned = if now > self.last {
            now
        } else {
            self.last + Duration::milliseconds(1)
        };
        self.last = assigned;
        assigned
    }
}

/// Server-side snapshot order: creation order with id tie-break.
pub(crate) fn sort_snapshot(records: &mut [Record]) {
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_never_repeats() {
        let mut clock = MonotonicClock::new(None);
        let a = clock.next();
        let b = clock.next();
        let c = clock.next();
        assert!(a < b && b < c);
        // Microsecond-aligned, matching what the SQLite backend persists.
        assert_eq!(a.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn clock_resumes_past_a_persisted_maximum() {
        let future = Utc::now() + Duration::days(1);
        let mut clock = MonotonicClock::new(Some(future));
        assert!(clock.next() > future);
    }

    #[test]
    fn fan_out_prunes_dropped_receivers() {
        let mut set = SubscriberSet::default();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        set.register("p".to_string(), tx_live);
        set.register("p".to_string(), tx_dead);
        drop(rx_dead);

        set.fan_out("p", &[]);
        assert_eq!(set.subscribers.len(), 1);
        assert!(matches!(
            rx_live.try_recv(),
            Ok(SubscriptionEvent::Snapshot(_))
        ));
    }
}
