//! Inline tag-type definitions carried through backup and restore.

use crate::domain::TagTypeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-defined inline tag type (for example "greek-word" or
/// "application"). These only exist so a restored dataset renders inline
/// markup the same way the exported one did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagType {
    #[serde(default)]
    pub id: TagTypeId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub created: DateTime<Utc>,
}

impl TagType {
    pub fn new(id: TagTypeId, name: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
            created,
        }
    }
}
