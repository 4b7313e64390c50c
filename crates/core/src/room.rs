use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Active,
    Planning,
}

impl RoomStatus {
    pub fn display(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Planning => "Planning",
        }
    }
}

/// A shared study room, listed under `public/study_rooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    pub owner_id: String,
    #[serde(default)]
    pub status: RoomStatus,
}

impl Room {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject: String::new(),
            owner_id: owner_id.into(),
            status: RoomStatus::default(),
        }
    }
}

impl Document for Room {
    const KIND: &'static str = "study_rooms";

    /// Name (case-insensitive), then creation order.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        a.data
            .name
            .to_lowercase()
            .cmp(&b.data.name.to_lowercase())
            .then_with(|| creation_order(a, b))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("owner_id", &self.owner_id)
    }
}

/// A user's membership in a room, under `public/study_rooms/{id}/members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            joined_at,
        }
    }
}

impl Document for Membership {
    const KIND: &'static str = "members";

    /// Join order.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        a.data
            .joined_at
            .cmp(&b.data.joined_at)
            .then_with(|| a.data.user_id.cmp(&b.data.user_id))
            .then_with(|| creation_order(a, b))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("user_id", &self.user_id)
    }
}
