//! Visibility and write rules, checked against the acting identity.
//!
//! User-scoped collections are private to their owner. The room listing and
//! member lists are public. Messages require membership (or room
//! ownership); joining a room is creating one's own membership record.
//! Checks run at subscribe/write time; an already-established subscription
//! is not re-checked when membership later changes.

use studyhall_core::{CollectionPath, FieldMap, Record, RoomCollection};

use crate::error::GatewayError;
use crate::store::RecordStore;

fn field_str<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(|v| v.as_str())
}

fn room_owner(store: &impl RecordStore, room_id: &str) -> Result<Option<String>, GatewayError> {
    let room = store.get(&CollectionPath::study_rooms(), room_id)?;
    Ok(room.and_then(|r| field_str(&r.fields, "owner_id").map(str::to_string)))
}

fn is_member(
    store: &impl RecordStore,
    room_id: &str,
    actor: &str,
) -> Result<bool, GatewayError> {
    let members = store.list(&CollectionPath::room_members(room_id))?;
    Ok(members
        .iter()
        .any(|m| field_str(&m.fields, "user_id") == Some(actor)))
}

fn can_enter(
    store: &impl RecordStore,
    room_id: &str,
    actor: &str,
) -> Result<bool, GatewayError> {
    Ok(room_owner(store, room_id)?.as_deref() == Some(actor)
        || is_member(store, room_id, actor)?)
}

/// Subscribe/read access.
pub(crate) fn check_read(
    store: &impl RecordStore,
    actor: &str,
    path: &CollectionPath,
) -> Result<(), GatewayError> {
    match path {
        CollectionPath::User { uid, .. } => {
            if uid == actor {
                Ok(())
            } else {
                Err(GatewayError::unauthorized(path))
            }
        }
        CollectionPath::StudyRooms => Ok(()),
        CollectionPath::Room {
            room_id,
            collection,
        } => match collection {
            // Who is in a public room is itself public, and joining needs
            // the member list before membership exists.
            RoomCollection::Members => Ok(()),
            RoomCollection::Messages => {
                if can_enter(store, room_id, actor)? {
                    Ok(())
                } else {
                    Err(GatewayError::unauthorized(path))
                }
            }
        },
    }
}

/// Create access, including field-level authorship checks.
pub(crate) fn check_create(
    store: &impl RecordStore,
    actor: &str,
    path: &CollectionPath,
    fields: &FieldMap,
) -> Result<(), GatewayError> {
    match path {
        CollectionPath::User { uid, .. } => {
            if uid == actor {
                Ok(())
            } else {
                Err(GatewayError::unauthorized(path))
            }
        }
        // Anyone may create a room, but only as its owner.
        CollectionPath::StudyRooms => {
            if field_str(fields, "owner_id") == Some(actor) {
                Ok(())
            } else {
                Err(GatewayError::unauthorized(path))
            }
        }
        CollectionPath::Room {
            room_id,
            collection,
        } => {
            if room_owner(store, room_id)?.is_none() {
                return Err(GatewayError::not_found(
                    CollectionPath::study_rooms(),
                    room_id.clone(),
                ));
            }
            match collection {
                // Joining: membership records are always for oneself.
                RoomCollection::Members => {
                    if field_str(fields, "user_id") == Some(actor) {
                        Ok(())
                    } else {
                        Err(GatewayError::unauthorized(path))
                    }
                }
                RoomCollection::Messages => {
                    if field_str(fields, "sender_id") == Some(actor)
                        && can_enter(store, room_id, actor)?
                    {
                        Ok(())
                    } else {
                        Err(GatewayError::unauthorized(path))
                    }
                }
            }
        }
    }
}

/// Update/delete access against the existing record.
pub(crate) fn check_mutate(
    store: &impl RecordStore,
    actor: &str,
    path: &CollectionPath,
    existing: &Record,
) -> Result<(), GatewayError> {
    let allowed = match path {
        CollectionPath::User { uid, .. } => uid == actor,
        CollectionPath::StudyRooms => field_str(&existing.fields, "owner_id") == Some(actor),
        CollectionPath::Room {
            room_id,
            collection,
        } => {
            let owner = room_owner(store, room_id)?;
            match collection {
                // Members leave on their own; the owner may remove anyone.
                RoomCollection::Members => {
                    field_str(&existing.fields, "user_id") == Some(actor)
                        || owner.as_deref() == Some(actor)
                }
                RoomCollection::Messages => {
                    field_str(&existing.fields, "sender_id") == Some(actor)
                }
            }
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(GatewayError::unauthorized(path))
    }
}
