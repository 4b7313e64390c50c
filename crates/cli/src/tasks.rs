use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;

use studyhall_core::CollectionPath;
use studyhall_core::task::{Priority, Task};

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, default_value = "")]
        description: String,
        /// high, medium, or low
        #[arg(long, value_enum, default_value = "high")]
        priority: PriorityArg,
    },

    /// List tasks in dashboard order
    List,

    /// Toggle a task's completion
    Done { id: String },

    /// Delete a task
    Rm { id: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}

pub async fn run(action: TaskAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let mut panel = app
        .open_panel::<Task>(&identity, CollectionPath::tasks(&identity.uid))
        .await?;

    match action {
        TaskAction::Add {
            title,
            due,
            description,
            priority,
        } => {
            let task = Task {
                title,
                description,
                due_date: due,
                priority: priority.into(),
                completed: false,
            };
            let record = panel.create(&task).await?;
            println!("Added task {}", short_id(&record.id));
        }
        TaskAction::List => {
            if panel.items().is_empty() {
                println!("No tasks yet.");
                return Ok(());
            }
            for task in panel.items() {
                println!(
                    "[{}] {} {} - due {} ({})",
                    if task.data.completed { "x" } else { " " },
                    short_id(&task.id),
                    task.data.title,
                    task.data.due_date,
                    task.data.priority.display(),
                );
            }
        }
        TaskAction::Done { id } => {
            let id = resolve_id(panel.items().iter().map(|t| t.id.as_str()), &id)?;
            let completed = panel.get(&id).map(|t| t.data.completed).unwrap_or(false);
            let mut patch = studyhall_core::FieldMap::new();
            patch.insert(
                "completed".to_string(),
                serde_json::Value::Bool(!completed),
            );
            panel.update(&id, patch).await?;
            println!(
                "Task {} marked {}.",
                short_id(&id),
                if completed { "open" } else { "done" }
            );
        }
        TaskAction::Rm { id } => {
            let id = resolve_id(panel.items().iter().map(|t| t.id.as_str()), &id)?;
            panel.delete(&id).await?;
            println!("Removed task {}.", short_id(&id));
        }
    }

    panel.unmount();
    Ok(())
}
