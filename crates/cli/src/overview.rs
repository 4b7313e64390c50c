use anyhow::Result;
use chrono::Local;

use studyhall_core::CollectionPath;
use studyhall_core::badges::{self, BadgeInputs};
use studyhall_core::goal::StudyGoal;
use studyhall_core::note::Note;
use studyhall_core::planner::PlannerEvent;
use studyhall_core::quiz::QuizRun;
use studyhall_core::stats::{self, dashboard_stats, subject_progress};
use studyhall_core::task::Task;

use crate::app::App;

pub async fn run() -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let uid = &identity.uid;
    let today = Local::now().date_naive();

    let mut tasks = app
        .open_panel::<Task>(&identity, CollectionPath::tasks(uid))
        .await?;
    let mut goals = app
        .open_panel::<StudyGoal>(&identity, CollectionPath::study_goals(uid))
        .await?;
    let mut notes = app
        .open_panel::<Note>(&identity, CollectionPath::notes(uid))
        .await?;
    let mut events = app
        .open_panel::<PlannerEvent>(&identity, CollectionPath::planner_events(uid))
        .await?;
    let mut runs = app
        .open_panel::<QuizRun>(&identity, CollectionPath::quiz_runs(uid))
        .await?;

    let stats = dashboard_stats(
        tasks.items(),
        goals.items(),
        notes.items(),
        events.items(),
        today,
    );

    println!("Dashboard for {}", identity.display_name);
    println!(
        "  tasks:  {} open / {} total ({} high priority)",
        stats.tasks_open, stats.tasks_total, stats.high_priority_open
    );
    println!(
        "  goals:  {} done / {} total, avg progress {}%",
        stats.goals_completed, stats.goals_total, stats.average_goal_progress
    );
    println!("  notes:  {}", stats.notes_total);
    println!(
        "  plan:   {} sessions, {} min planned, streak {} days",
        stats.events_total, stats.planned_minutes, stats.streak_days
    );

    let progress = subject_progress(events.items(), today);
    if !progress.is_empty() {
        println!("Subject progress:");
        for (subject, percent) in progress {
            println!("  {subject:<20} {percent:>3}%");
        }
    }

    let high_quiz_scores = runs
        .items()
        .iter()
        .filter(|r| r.data.score().is_high_score())
        .count() as u64;
    let inputs = BadgeInputs {
        completed_sessions: stats.completed_sessions,
        streak_days: stats.streak_days,
        high_quiz_scores,
        tracked_sessions: stats::tracked_sessions(events.items()),
    };

    println!("Badges:");
    for status in badges::evaluate(&inputs) {
        let mark = if status.earned { "*" } else { " " };
        println!("  [{mark}] {:<14} {}", status.badge.name, status.badge.description);
    }

    tasks.unmount();
    goals.unmount();
    notes.unmount();
    events.unmount();
    runs.unmount();
    Ok(())
}
