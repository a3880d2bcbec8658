//! Topic entity: a node in the parent-pointer taxonomy tree.

use crate::domain::{EntryId, TopicId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node in the topic taxonomy.
///
/// Topics form a forest through the nullable `parent_id` pointer; `None`
/// marks a root. Acyclicity is an invariant of the stored structure,
/// enforced at the single mutation point ([`crate::engine::TopicTaxonomy::set_parent`])
/// rather than by this type. `systematic_tag_id` optionally cross-links the
/// topic to a doctrine entry, which is what lets passage lookups suggest
/// topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(default)]
    pub id: TopicId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<TopicId>,
    pub sort_order: i64,
    #[serde(default)]
    pub systematic_tag_id: Option<EntryId>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Error returned when constructing an invalid topic.
#[derive(Debug, Clone)]
pub struct ParseTopicError(String);

impl fmt::Display for ParseTopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTopicError {}

impl Topic {
    /// Creates a root topic with a trimmed, non-empty name.
    pub fn new(
        id: TopicId,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ParseTopicError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ParseTopicError("topic name cannot be empty".to_string()));
        }
        Ok(Self {
            id,
            name,
            parent_id: None,
            sort_order: 0,
            systematic_tag_id: None,
            created: now,
            modified: now,
        })
    }

    /// Returns a copy re-parented under `parent`.
    pub fn under(mut self, parent: TopicId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Returns a copy with the given sort order.
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Returns a copy cross-linked to a systematic entry.
    pub fn with_systematic_tag(mut self, entry_id: EntryId) -> Self {
        self.systematic_tag_id = Some(entry_id);
        self
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
