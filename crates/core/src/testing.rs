//! Shared factories for tests, mirrored across the workspace via the
//! `testing` feature.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::document::Stored;
use crate::record::{Record, to_fields};

/// Fixed epoch for deterministic test data: 2026-08-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()
}

/// `epoch()` plus a number of seconds.
pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    epoch() + chrono::Duration::seconds(seconds)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A stored document created `minutes` after the epoch.
pub fn stored_at<T>(id: &str, minutes: i64, data: T) -> Stored<T> {
    Stored {
        id: id.to_string(),
        created_at: epoch() + chrono::Duration::minutes(minutes),
        data,
    }
}

/// A raw record created `minutes` after the epoch, with fields encoded from
/// the given document.
pub fn record_at<T: Serialize>(id: &str, minutes: i64, data: &T) -> Record {
    Record::new(
        id.to_string(),
        epoch() + chrono::Duration::minutes(minutes),
        to_fields(data).expect("test document encodes to an object"),
    )
}
