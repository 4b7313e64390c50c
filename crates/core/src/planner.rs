use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

/// A scheduled study session on the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerEvent {
    pub title: String,
    #[serde(default)]
    pub subject: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl PlannerEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            subject: String::new(),
            date,
            time: None,
            duration_minutes: None,
        }
    }
}

impl Document for PlannerEvent {
    const KIND: &'static str = "planner_events";

    /// Date, then timed events before untimed ones, then creation order.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        let time_key = |e: &Stored<Self>| match e.data.time {
            Some(t) => (0u8, t),
            None => (1u8, NaiveTime::MIN),
        };
        a.data
            .date
            .cmp(&b.data.date)
            .then_with(|| time_key(a).cmp(&time_key(b)))
            .then_with(|| creation_order(a, b))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn event(date: NaiveDate, time: Option<NaiveTime>) -> PlannerEvent {
        let mut e = PlannerEvent::new("session", date);
        e.time = time;
        e
    }

    #[test]
    fn orders_by_date_then_time_untimed_last() {
        let day = testing::date(2026, 8, 10);
        let stored = vec![
            testing::stored_at("untimed", 0, event(day, None)),
            testing::stored_at("evening", 1, event(day, NaiveTime::from_hms_opt(19, 0, 0))),
            testing::stored_at("morning", 2, event(day, NaiveTime::from_hms_opt(9, 0, 0))),
            testing::stored_at("tomorrow", 3, event(testing::date(2026, 8, 11), None)),
        ];
        let mut sorted = stored.clone();
        sorted.sort_by(PlannerEvent::order);
        let ids: Vec<&str> = sorted.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["morning", "evening", "untimed", "tomorrow"]);
    }

    #[test]
    fn optional_fields_stay_off_the_wire() {
        let e = PlannerEvent::new("session", testing::date(2026, 8, 10));
        let value = serde_json::to_value(&e).unwrap();
        assert!(value.get("time").is_none());
        assert!(value.get("duration_minutes").is_none());
    }
}
