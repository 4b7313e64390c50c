use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

/// Task priority, highest first in the default view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    High,
    Medium,
    Low,
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A to-do item on the task panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            priority: Priority::default(),
            completed: false,
        }
    }
}

impl Document for Task {
    const KIND: &'static str = "tasks";

    /// Priority, then incomplete before complete, then creation order.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        a.data
            .priority
            .rank()
            .cmp(&b.data.priority.rank())
            .then_with(|| a.data.completed.cmp(&b.data.completed))
            .then_with(|| creation_order(a, b))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }
}
