//! Scripture index edges: links from systematic entries to Bible passages.

use crate::domain::{Book, EntryId};
use serde::{Deserialize, Serialize};

/// One edge from a systematic entry to a passage.
///
/// A primary edge is the doctrine's central proof-text and outranks
/// secondary edges in every ordering. `start_verse`/`end_verse` are
/// nullable: a NULL start covers the whole chapter, a NULL end leaves the
/// range open to the end of the chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptureIndexEntry {
    pub systematic_id: EntryId,
    pub book: Book,
    pub chapter: u16,
    #[serde(default)]
    pub start_verse: Option<u16>,
    #[serde(default)]
    pub end_verse: Option<u16>,
    pub is_primary: bool,
    #[serde(default)]
    pub context_snippet: Option<String>,
}

impl ScriptureIndexEntry {
    /// Returns whether this edge covers the given verse.
    ///
    /// An edge with no start verse covers the whole chapter. With a start
    /// verse, the edge matches when `start_verse <= verse` and the end
    /// verse is absent or `>= verse`.
    pub fn covers_verse(&self, verse: u16) -> bool {
        match self.start_verse {
            None => true,
            Some(start) => start <= verse && self.end_verse.is_none_or(|end| end >= verse),
        }
    }
}
