use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Collections scoped to a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCollection {
    Tasks,
    StudyGoals,
    Notes,
    PlannerEvents,
    QuizQuestions,
    QuizRuns,
}

impl UserCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::StudyGoals => "study_goals",
            Self::Notes => "notes",
            Self::PlannerEvents => "planner_events",
            Self::QuizQuestions => "quiz_questions",
            Self::QuizRuns => "quiz_runs",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "tasks" => Some(Self::Tasks),
            "study_goals" => Some(Self::StudyGoals),
            "notes" => Some(Self::Notes),
            "planner_events" => Some(Self::PlannerEvents),
            "quiz_questions" => Some(Self::QuizQuestions),
            "quiz_runs" => Some(Self::QuizRuns),
            _ => None,
        }
    }
}

/// Collections scoped to a study room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomCollection {
    Messages,
    Members,
}

impl RoomCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Members => "members",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "messages" => Some(Self::Messages),
            "members" => Some(Self::Members),
            _ => None,
        }
    }
}

/// Logical address of a named set of records.
///
/// The canonical string forms are `users/{uid}/{collection}`,
/// `public/study_rooms`, and `public/study_rooms/{roomId}/{collection}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionPath {
    User {
        uid: String,
        collection: UserCollection,
    },
    StudyRooms,
    Room {
        room_id: String,
        collection: RoomCollection,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("not a collection path: {input}")]
pub struct ParsePathError {
    pub input: String,
}

impl CollectionPath {
    pub fn tasks(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::Tasks,
        }
    }

    pub fn study_goals(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::StudyGoals,
        }
    }

    pub fn notes(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::Notes,
        }
    }

    pub fn planner_events(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::PlannerEvents,
        }
    }

    pub fn quiz_questions(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::QuizQuestions,
        }
    }

    pub fn quiz_runs(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            collection: UserCollection::QuizRuns,
        }
    }

    pub fn study_rooms() -> Self {
        Self::StudyRooms
    }

    pub fn room_messages(room_id: impl Into<String>) -> Self {
        Self::Room {
            room_id: room_id.into(),
            collection: RoomCollection::Messages,
        }
    }

    pub fn room_members(room_id: impl Into<String>) -> Self {
        Self::Room {
            room_id: room_id.into(),
            collection: RoomCollection::Members,
        }
    }

    /// Owning uid for user-scoped paths.
    pub fn owner_uid(&self) -> Option<&str> {
        match self {
            Self::User { uid, .. } => Some(uid),
            _ => None,
        }
    }

    /// Room id for room-scoped paths.
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Room { room_id, .. } => Some(room_id),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { uid, collection } => {
                write!(f, "users/{uid}/{}", collection.as_str())
            }
            Self::StudyRooms => f.write_str("public/study_rooms"),
            Self::Room {
                room_id,
                collection,
            } => write!(f, "public/study_rooms/{room_id}/{}", collection.as_str()),
        }
    }
}

impl FromStr for CollectionPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePathError {
            input: s.to_string(),
        };
        let segments: Vec<&str> = s.split('/').collect();
        match segments.as_slice() {
            ["users", uid, collection] if !uid.is_empty() => {
                let collection = UserCollection::parse(collection).ok_or_else(err)?;
                Ok(Self::User {
                    uid: (*uid).to_string(),
                    collection,
                })
            }
            ["public", "study_rooms"] => Ok(Self::StudyRooms),
            ["public", "study_rooms", room_id, collection] if !room_id.is_empty() => {
                let collection = RoomCollection::parse(collection).ok_or_else(err)?;
                Ok(Self::Room {
                    room_id: (*room_id).to_string(),
                    collection,
                })
            }
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms_roundtrip() {
        let paths = [
            CollectionPath::tasks("u1"),
            CollectionPath::study_goals("u1"),
            CollectionPath::notes("u1"),
            CollectionPath::planner_events("u1"),
            CollectionPath::quiz_questions("u1"),
            CollectionPath::quiz_runs("u1"),
            CollectionPath::study_rooms(),
            CollectionPath::room_messages("r1"),
            CollectionPath::room_members("r1"),
        ];
        for path in paths {
            let parsed: CollectionPath = path.to_string().parse().unwrap();
            assert_eq!(parsed, path);
        }
    }

    #[test]
    fn display_matches_logical_keys() {
        assert_eq!(CollectionPath::tasks("u1").to_string(), "users/u1/tasks");
        assert_eq!(
            CollectionPath::study_rooms().to_string(),
            "public/study_rooms"
        );
        assert_eq!(
            CollectionPath::room_messages("r1").to_string(),
            "public/study_rooms/r1/messages"
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for input in [
            "",
            "users",
            "users/u1",
            "users//tasks",
            "users/u1/unknown",
            "public/study_rooms/r1",
            "public/study_rooms/r1/unknown",
            "public/study_rooms//messages",
            "teams/t1/tasks",
        ] {
            assert!(input.parse::<CollectionPath>().is_err(), "{input}");
        }
    }

    #[test]
    fn scoping_accessors() {
        assert_eq!(CollectionPath::tasks("u1").owner_uid(), Some("u1"));
        assert_eq!(CollectionPath::tasks("u1").room_id(), None);
        assert_eq!(CollectionPath::room_members("r9").room_id(), Some("r9"));
        assert_eq!(CollectionPath::study_rooms().owner_uid(), None);
    }
}
