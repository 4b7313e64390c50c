use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::document::Stored;
use crate::goal::{GoalStatus, StudyGoal};
use crate::note::Note;
use crate::planner::PlannerEvent;
use crate::task::{Priority, Task};

/// Aggregate numbers shown on the dashboard overview.
///
/// Computed purely from materialized panel views; `today` is passed in so
/// results are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub tasks_total: u64,
    pub tasks_completed: u64,
    pub tasks_open: u64,
    pub high_priority_open: u64,
    pub goals_total: u64,
    pub goals_completed: u64,
    /// Mean goal progress, 0 when there are no goals.
    pub average_goal_progress: u8,
    pub notes_total: u64,
    pub events_total: u64,
    pub planned_minutes: u64,
    pub completed_sessions: u64,
    pub streak_days: u64,
}

pub fn dashboard_stats(
    tasks: &[Stored<Task>],
    goals: &[Stored<StudyGoal>],
    notes: &[Stored<Note>],
    events: &[Stored<PlannerEvent>],
    today: NaiveDate,
) -> DashboardStats {
    let tasks_completed = tasks.iter().filter(|t| t.data.completed).count() as u64;
    let high_priority_open = tasks
        .iter()
        .filter(|t| !t.data.completed && t.data.priority == Priority::High)
        .count() as u64;

    let goals_completed = goals
        .iter()
        .filter(|g| g.data.status == GoalStatus::Completed)
        .count() as u64;
    let average_goal_progress = if goals.is_empty() {
        0
    } else {
        let sum: u64 = goals.iter().map(|g| u64::from(g.data.progress)).sum();
        (sum / goals.len() as u64) as u8
    };

    let planned_minutes = events
        .iter()
        .filter_map(|e| e.data.duration_minutes)
        .map(u64::from)
        .sum();

    DashboardStats {
        tasks_total: tasks.len() as u64,
        tasks_completed,
        tasks_open: tasks.len() as u64 - tasks_completed,
        high_priority_open,
        goals_total: goals.len() as u64,
        goals_completed,
        average_goal_progress,
        notes_total: notes.len() as u64,
        events_total: events.len() as u64,
        planned_minutes,
        completed_sessions: completed_sessions(events, today),
        streak_days: study_streak(events, today),
    }
}

/// Planner events on or before `today` count as completed study sessions.
pub fn completed_sessions(events: &[Stored<PlannerEvent>], today: NaiveDate) -> u64 {
    events.iter().filter(|e| e.data.date <= today).count() as u64
}

/// Sessions planned with an explicit duration count as time-tracked.
pub fn tracked_sessions(events: &[Stored<PlannerEvent>]) -> u64 {
    events
        .iter()
        .filter(|e| e.data.duration_minutes.is_some())
        .count() as u64
}

/// Consecutive days ending at `today` with at least one planner event.
pub fn study_streak(events: &[Stored<PlannerEvent>], today: NaiveDate) -> u64 {
    let days: HashSet<NaiveDate> = events.iter().map(|e| e.data.date).collect();
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        let Some(previous) = day.pred_opt() else {
            break;
        };
        day = previous;
    }
    streak
}

/// Per-subject progress through the planned schedule: the percentage of each
/// subject's events on or before `today`. Events without a subject are
/// grouped under "General". Sorted by subject name.
pub fn subject_progress(events: &[Stored<PlannerEvent>], today: NaiveDate) -> Vec<(String, u8)> {
    let mut per_subject: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for event in events {
        let subject = if event.data.subject.trim().is_empty() {
            "General".to_string()
        } else {
            event.data.subject.clone()
        };
        let entry = per_subject.entry(subject).or_default();
        entry.1 += 1;
        if event.data.date <= today {
            entry.0 += 1;
        }
    }
    per_subject
        .into_iter()
        .map(|(subject, (done, total))| (subject, ((done * 100) / total) as u8))
        .collect()
}
