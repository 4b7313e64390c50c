use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored};
use crate::validate::{ValidationError, require};

/// A chat message in a study room.
///
/// `timestamp` is the sender-side send time and drives the view ordering;
/// the record's `created_at` only breaks ties beyond the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        sender_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            sender_id: sender_id.into(),
            timestamp,
        }
    }
}

impl Document for Message {
    const KIND: &'static str = "messages";

    /// Timestamp ascending, stable id tie-break for equal timestamps.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        a.data
            .timestamp
            .cmp(&b.data.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("text", &self.text)?;
        require("sender_id", &self.sender_id)
    }
}
