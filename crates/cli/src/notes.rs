use anyhow::Result;
use clap::Subcommand;

use studyhall_core::CollectionPath;
use studyhall_core::note::Note;

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note
    Add {
        title: String,
        /// Note body (defaults to empty)
        #[arg(long, default_value = "")]
        body: String,
    },

    /// List notes, newest first
    List,

    /// Print one note in full
    Show { id: String },

    /// Delete a note
    Rm { id: String },
}

pub async fn run(action: NoteAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let mut panel = app
        .open_panel::<Note>(&identity, CollectionPath::notes(&identity.uid))
        .await?;

    match action {
        NoteAction::Add { title, body } => {
            let record = panel.create(&Note::new(title, body)).await?;
            println!("Added note {}", short_id(&record.id));
        }
        NoteAction::List => {
            if panel.items().is_empty() {
                println!("No notes yet.");
                return Ok(());
            }
            for note in panel.items() {
                let preview = note.data.preview();
                if preview.is_empty() {
                    println!("{} {}", short_id(&note.id), note.data.title);
                } else {
                    println!("{} {}: {preview}", short_id(&note.id), note.data.title);
                }
            }
        }
        NoteAction::Show { id } => {
            let id = resolve_id(panel.items().iter().map(|n| n.id.as_str()), &id)?;
            let Some(note) = panel.get(&id) else {
                anyhow::bail!("note disappeared while reading");
            };
            println!("# {}", note.data.title);
            println!("{}", note.data.body);
        }
        NoteAction::Rm { id } => {
            let id = resolve_id(panel.items().iter().map(|n| n.id.as_str()), &id)?;
            panel.delete(&id).await?;
            println!("Removed note {}.", short_id(&id));
        }
    }

    panel.unmount();
    Ok(())
}
