use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Completed,
}

impl GoalStatus {
    pub fn display(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// A study goal with a completion percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGoal {
    pub title: String,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: GoalStatus,
}

impl StudyGoal {
    pub fn new(title: impl Into<String>, deadline: NaiveDate) -> Self {
        Self {
            title: title.into(),
            deadline,
            progress: 0,
            status: GoalStatus::default(),
        }
    }
}

impl Document for StudyGoal {
    const KIND: &'static str = "study_goals";

    /// Nearest deadline first.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        a.data
            .deadline
            .cmp(&b.data.deadline)
            .then_with(|| creation_order(a, b))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        if self.progress > 100 {
            return Err(ValidationError::OutOfRange {
                field: "progress",
                value: u32::from(self.progress),
                max: 100,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn progress_over_100_is_rejected() {
        let mut goal = StudyGoal::new("Read 50 pages", testing::date(2026, 8, 30));
        goal.progress = 101;
        assert!(matches!(
            goal.validate(),
            Err(ValidationError::OutOfRange { field: "progress", .. })
        ));
        goal.progress = 100;
        assert!(goal.validate().is_ok());
    }

    #[test]
    fn orders_by_deadline() {
        let g = |d: NaiveDate| StudyGoal::new("g", d);
        let stored = vec![
            testing::stored_at("later", 0, g(testing::date(2026, 9, 15))),
            testing::stored_at("sooner", 1, g(testing::date(2026, 8, 30))),
        ];
        let mut sorted = stored.clone();
        sorted.sort_by(StudyGoal::order);
        assert_eq!(sorted[0].id, "sooner");
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let goal = StudyGoal::new("g", testing::date(2026, 9, 1));
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["status"], "in-progress");
    }
}
