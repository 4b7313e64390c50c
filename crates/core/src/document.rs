use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::record::Record;
use crate::validate::ValidationError;

/// A typed feature document that lives in one kind of collection.
///
/// `order` defines the view ordering for the live list; implementations must
/// make it total by falling back to `created_at` and `id`, so that sorting
/// any permutation of the same snapshot yields the same sequence.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection kind, used in diagnostics ("tasks", "messages", ...).
    const KIND: &'static str;

    /// View ordering between two stored documents.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering;

    /// Local validation, run before any gateway write.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A decoded document together with its record envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub data: T,
}

impl<T: Document> Stored<T> {
    /// Decode a raw record into a stored document.
    pub fn decode(record: &Record) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: record.id.clone(),
            created_at: record.created_at,
            data: record.decode()?,
        })
    }
}

/// Shared final tie-break: creation order, then id.
pub(crate) fn creation_order<T>(a: &Stored<T>, b: &Stored<T>) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
