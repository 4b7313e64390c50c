pub mod badges;
pub mod document;
pub mod goal;
pub mod message;
pub mod note;
pub mod path;
pub mod planner;
pub mod profile;
pub mod quiz;
pub mod record;
pub mod room;
pub mod stats;
pub mod task;
pub mod validate;

pub use document::{Document, Stored};
pub use path::{CollectionPath, RoomCollection, UserCollection};
pub use record::{FieldMap, Record, to_fields};
pub use validate::ValidationError;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
