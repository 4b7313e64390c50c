use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;

use studyhall_core::CollectionPath;
use studyhall_core::goal::{GoalStatus, StudyGoal};

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a study goal
    Add {
        title: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: NaiveDate,
    },

    /// List goals by nearest deadline
    List,

    /// Set a goal's progress percentage (100 completes it)
    Progress {
        id: String,
        /// 0-100
        percent: u8,
    },

    /// Delete a goal
    Rm { id: String },
}

pub async fn run(action: GoalAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let mut panel = app
        .open_panel::<StudyGoal>(&identity, CollectionPath::study_goals(&identity.uid))
        .await?;

    match action {
        GoalAction::Add { title, deadline } => {
            let record = panel.create(&StudyGoal::new(title, deadline)).await?;
            println!("Added goal {}", short_id(&record.id));
        }
        GoalAction::List => {
            if panel.items().is_empty() {
                println!("No goals yet.");
                return Ok(());
            }
            for goal in panel.items() {
                println!(
                    "{} {} - due {} - {}% ({})",
                    short_id(&goal.id),
                    goal.data.title,
                    goal.data.deadline,
                    goal.data.progress,
                    goal.data.status.display(),
                );
            }
        }
        GoalAction::Progress { id, percent } => {
            let id = resolve_id(panel.items().iter().map(|g| g.id.as_str()), &id)?;
            let Some(existing) = panel.get(&id) else {
                anyhow::bail!("goal disappeared while updating");
            };
            let mut updated = existing.data.clone();
            updated.progress = percent;
            updated.status = if percent >= 100 {
                GoalStatus::Completed
            } else {
                GoalStatus::InProgress
            };
            panel.set(&id, &updated).await?;
            println!("Goal {} now at {percent}%.", short_id(&id));
        }
        GoalAction::Rm { id } => {
            let id = resolve_id(panel.items().iter().map(|g| g.id.as_str()), &id)?;
            panel.delete(&id).await?;
            println!("Removed goal {}.", short_id(&id));
        }
    }

    panel.unmount();
    Ok(())
}
