//! Command handlers for the CLI.

mod backup;
mod notes;
mod parse;
mod passage;
mod topics;

use anyhow::{Context, Result, bail};
use std::path::Path;

pub use backup::{handle_export, handle_import};
pub use notes::{handle_list, handle_new, handle_rm, handle_search, handle_show};
pub use parse::handle_parse;
pub use passage::{handle_backrefs, handle_passage, handle_suggest};
pub use topics::{handle_topic_mv, handle_topic_new, handle_topic_rm, handle_topics};

use crate::domain::{Book, Note, NoteId, Reference, Topic, TopicId};
use crate::store::Store;

/// Opens the store, creating the database file on first use.
pub(crate) fn open_store(db_path: &Path) -> Result<Store> {
    Store::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

/// Parses a free-text verse reference or fails with a usable message.
pub(crate) fn parse_reference(text: &str) -> Result<Reference> {
    match Reference::parse(text) {
        Some(reference) => Ok(reference),
        None => bail!("could not parse reference '{}'", text),
    }
}

/// Splits a reference into the (book, chapter, verse) shape that passage
/// lookups take. The verse is set only for single-verse references; a
/// range or bare chapter queries the whole chapter.
pub(crate) fn passage_parts(reference: Reference) -> (Book, u16, Option<u16>) {
    let verse = match (reference.start_verse(), reference.end_verse()) {
        (Some(start), Some(end))
            if start == end && reference.start_chapter() == reference.end_chapter() =>
        {
            Some(start)
        }
        _ => None,
    };
    (reference.book(), reference.start_chapter(), verse)
}

/// Resolves a note argument: an id first, then an exact title match.
pub(crate) fn resolve_note(store: &Store, arg: &str) -> Result<Note> {
    if let Ok(id) = arg.parse::<NoteId>()
        && let Some(note) = store.get_note(id)?
    {
        return Ok(note);
    }
    let mut matches: Vec<Note> = store
        .list_notes()?
        .into_iter()
        .filter(|n| n.title() == arg)
        .collect();
    match matches.len() {
        0 => bail!("no note matching '{}'", arg),
        1 => Ok(matches.swap_remove(0)),
        n => bail!("'{}' is ambiguous: {} notes share that title", arg, n),
    }
}

/// Resolves a topic argument: an id first, then an exact name match.
pub(crate) fn resolve_topic(store: &Store, arg: &str) -> Result<Topic> {
    if let Ok(id) = arg.parse::<TopicId>()
        && let Some(topic) = store.get_topic(id)?
    {
        return Ok(topic);
    }
    match store.find_topic_by_name(arg)? {
        Some(topic) => Ok(topic),
        None => bail!("no topic matching '{}'", arg),
    }
}
