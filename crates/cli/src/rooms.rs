use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Subcommand;

use studyhall_core::CollectionPath;
use studyhall_core::message::Message;
use studyhall_core::room::{Membership, Room, RoomStatus};
use studyhall_sync::{Identity, Panel};

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum RoomAction {
    /// Create a study room (and join it)
    Create {
        name: String,
        #[arg(long, default_value = "")]
        subject: String,
        /// Mark the room as still being planned
        #[arg(long)]
        planning: bool,
    },

    /// List all study rooms
    List,

    /// Join a room
    Join { room: String },

    /// Leave a room
    Leave { room: String },

    /// List a room's members
    Members { room: String },

    /// Send a message to a room
    Send { room: String, text: Vec<String> },

    /// Show a room's message history
    History { room: String },
}

pub async fn run(action: RoomAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;

    match action {
        RoomAction::Create {
            name,
            subject,
            planning,
        } => {
            let mut rooms = open_rooms(&app, &identity).await?;
            let room = Room {
                name,
                subject,
                owner_id: identity.uid.clone(),
                status: if planning {
                    RoomStatus::Planning
                } else {
                    RoomStatus::Active
                },
            };
            let record = rooms.create(&room).await?;

            // The owner is also the first member.
            let mut members = app
                .open_panel::<Membership>(&identity, CollectionPath::room_members(&record.id))
                .await?;
            members
                .create(&Membership::new(identity.uid.clone(), Utc::now()))
                .await?;
            members.unmount();

            println!("Created room {} ({})", room_label(&room), short_id(&record.id));
            rooms.unmount();
        }
        RoomAction::List => {
            let mut rooms = open_rooms(&app, &identity).await?;
            if rooms.items().is_empty() {
                println!("No study rooms yet.");
            }
            for room in rooms.items() {
                println!(
                    "{} {} - {}",
                    short_id(&room.id),
                    room_label(&room.data),
                    room.data.status.display(),
                );
            }
            rooms.unmount();
        }
        RoomAction::Join { room } => {
            let room_id = find_room(&app, &identity, &room).await?;
            let mut members = app
                .open_panel::<Membership>(&identity, CollectionPath::room_members(&room_id))
                .await?;
            if members
                .items()
                .iter()
                .any(|m| m.data.user_id == identity.uid)
            {
                println!("Already a member of {}.", short_id(&room_id));
            } else {
                members
                    .create(&Membership::new(identity.uid.clone(), Utc::now()))
                    .await?;
                println!("Joined room {}.", short_id(&room_id));
            }
            members.unmount();
        }
        RoomAction::Leave { room } => {
            let room_id = find_room(&app, &identity, &room).await?;
            let mut members = app
                .open_panel::<Membership>(&identity, CollectionPath::room_members(&room_id))
                .await?;
            let own = members
                .items()
                .iter()
                .find(|m| m.data.user_id == identity.uid)
                .map(|m| m.id.clone());
            match own {
                Some(membership_id) => {
                    members.delete(&membership_id).await?;
                    println!("Left room {}.", short_id(&room_id));
                }
                None => println!("Not a member of {}.", short_id(&room_id)),
            }
            members.unmount();
        }
        RoomAction::Members { room } => {
            let room_id = find_room(&app, &identity, &room).await?;
            let mut members = app
                .open_panel::<Membership>(&identity, CollectionPath::room_members(&room_id))
                .await?;
            for member in members.items() {
                let marker = if member.data.user_id == identity.uid {
                    " (you)"
                } else {
                    ""
                };
                println!(
                    "{}{marker} - joined {}",
                    short_id(&member.data.user_id),
                    member.data.joined_at.format("%Y-%m-%d"),
                );
            }
            members.unmount();
        }
        RoomAction::Send { room, text } => {
            let room_id = find_room(&app, &identity, &room).await?;
            let mut messages = app
                .open_panel::<Message>(&identity, CollectionPath::room_messages(&room_id))
                .await
                .context("no access to this room's messages (join it first)")?;
            messages
                .create(&Message::new(text.join(" "), identity.uid.clone(), Utc::now()))
                .await?;
            println!("Sent.");
            messages.unmount();
        }
        RoomAction::History { room } => {
            let room_id = find_room(&app, &identity, &room).await?;
            let mut messages = app
                .open_panel::<Message>(&identity, CollectionPath::room_messages(&room_id))
                .await
                .context("no access to this room's messages (join it first)")?;
            if messages.items().is_empty() {
                println!("No messages yet.");
            }
            for message in messages.items() {
                let sender = if message.data.sender_id == identity.uid {
                    "you".to_string()
                } else {
                    short_id(&message.data.sender_id).to_string()
                };
                println!(
                    "[{}] {sender}: {}",
                    message
                        .data
                        .timestamp
                        .with_timezone(&Local)
                        .format("%H:%M"),
                    message.data.text,
                );
            }
            messages.unmount();
        }
    }

    Ok(())
}

async fn open_rooms(
    app: &App,
    identity: &Identity,
) -> Result<Panel<Room, studyhall_gateway::SqliteGateway>> {
    app.open_panel::<Room>(identity, CollectionPath::study_rooms())
        .await
}

/// Resolve a room by id prefix or exact name.
async fn find_room(app: &App, identity: &Identity, needle: &str) -> Result<String> {
    let mut rooms = open_rooms(app, identity).await?;
    let by_name: Vec<&str> = rooms
        .items()
        .iter()
        .filter(|r| r.data.name == needle)
        .map(|r| r.id.as_str())
        .collect();
    let resolved = if by_name.len() == 1 {
        Ok(by_name[0].to_string())
    } else {
        resolve_id(rooms.items().iter().map(|r| r.id.as_str()), needle)
    };
    rooms.unmount();
    resolved.with_context(|| format!("no room matching '{needle}'"))
}

fn room_label(room: &Room) -> String {
    if room.subject.is_empty() {
        room.name.clone()
    } else {
        format!("{} ({})", room.name, room.subject)
    }
}
