//! Sermon series: a named grouping of sermon-type notes.

use crate::domain::SeriesId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named grouping of sermon notes. A note belongs to at most one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    #[serde(default)]
    pub id: SeriesId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

impl Series {
    pub fn new(id: SeriesId, name: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            created,
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
