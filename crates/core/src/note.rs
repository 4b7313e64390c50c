use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Stored, creation_order};
use crate::validate::{ValidationError, require};

/// Preview length in characters.
const PREVIEW_CHARS: usize = 80;

/// A free-form note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// First `PREVIEW_CHARS` characters of the body, cut on a char boundary.
    pub fn preview(&self) -> &str {
        match self.body.char_indices().nth(PREVIEW_CHARS) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }
}

impl Document for Note {
    const KIND: &'static str = "notes";

    /// Newest first.
    fn order(a: &Stored<Self>, b: &Stored<Self>) -> Ordering {
        creation_order(b, a)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }
}
