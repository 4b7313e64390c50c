use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

use studyhall_core::CollectionPath;
use studyhall_core::planner::PlannerEvent;

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Schedule a study session
    Add {
        title: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        subject: String,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,
    },

    /// List planned sessions in schedule order
    List,

    /// Delete a planned session
    Rm { id: String },
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| e.to_string())
}

pub async fn run(action: PlanAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let mut panel = app
        .open_panel::<PlannerEvent>(&identity, CollectionPath::planner_events(&identity.uid))
        .await?;

    match action {
        PlanAction::Add {
            title,
            date,
            subject,
            time,
            duration,
        } => {
            let event = PlannerEvent {
                title,
                subject,
                date,
                time,
                duration_minutes: duration,
            };
            let record = panel.create(&event).await?;
            println!("Planned session {}", short_id(&record.id));
        }
        PlanAction::List => {
            if panel.items().is_empty() {
                println!("Nothing planned yet.");
                return Ok(());
            }
            for event in panel.items() {
                let time = event
                    .data
                    .time
                    .map(|t| t.format(" %H:%M").to_string())
                    .unwrap_or_default();
                let duration = event
                    .data
                    .duration_minutes
                    .map(|m| format!(" ({m} min)"))
                    .unwrap_or_default();
                let subject = if event.data.subject.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", event.data.subject)
                };
                println!(
                    "{} {}{time}{duration} {}{subject}",
                    short_id(&event.id),
                    event.data.date,
                    event.data.title,
                );
            }
        }
        PlanAction::Rm { id } => {
            let id = resolve_id(panel.items().iter().map(|e| e.id.as_str()), &id)?;
            panel.delete(&id).await?;
            println!("Removed session {}.", short_id(&id));
        }
    }

    panel.unmount();
    Ok(())
}
