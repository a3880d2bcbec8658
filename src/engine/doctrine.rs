//! Bidirectional lookup between Bible passages and systematic-theology
//! entries, plus passage-driven topic suggestions.

use crate::domain::{Book, EntryId, Note, SystematicEntry, Topic};
use crate::store::{Store, StoreError, StoreResult};
use std::collections::HashSet;

/// Where a suggested topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// The topic is cross-linked to a doctrine entry covering the passage.
    Doctrine,
    /// The topic is already in use by a note on the same passage.
    ExistingNotes,
}

/// One candidate topic for a passage, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSuggestion {
    #[serde(flatten)]
    pub topic: Topic,
    pub source: SuggestionSource,
}

/// Passage/doctrine lookups over the scripture index and note content.
pub struct DoctrineIndex<'a> {
    store: &'a Store,
}

impl<'a> DoctrineIndex<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Returns the doctrine entries whose scripture index touches the
    /// passage, primary proof-texts first, then in hierarchy order.
    ///
    /// Without a verse, every edge on the chapter matches. With one, an
    /// edge matches when it covers that verse. Entries reached through
    /// several edges appear once, at their best-ranked position.
    pub fn doctrines_for_passage(
        &self,
        book: Book,
        chapter: u16,
        verse: Option<u16>,
    ) -> StoreResult<Vec<SystematicEntry>> {
        let pairs = self.store.edges_for_passage(book, chapter)?;
        let mut seen: HashSet<EntryId> = HashSet::new();
        let mut entries = Vec::new();
        for (edge, entry) in pairs {
            if let Some(v) = verse
                && !edge.covers_verse(v)
            {
                continue;
            }
            if seen.insert(entry.id) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Returns the notes whose content embeds the entry's canonical link
    /// token.
    ///
    /// Matching is literal substring search over stored content. Entries
    /// that are not addressable (parts) have no token and match nothing.
    ///
    /// # Errors
    ///
    /// `NotFound` when the entry does not exist.
    pub fn notes_referencing(&self, systematic_id: EntryId) -> StoreResult<Vec<Note>> {
        let entry = self
            .store
            .get_systematic_entry(systematic_id)?
            .ok_or(StoreError::NotFound {
                kind: "systematic entry",
                id: systematic_id.to_string(),
            })?;
        match entry.link_token() {
            Some(token) => self.store.notes_containing(&token),
            None => Ok(Vec::new()),
        }
    }

    /// Suggests topics for a passage.
    ///
    /// Doctrine-linked topics come first: every topic cross-linked to a
    /// doctrine entry covering the passage. Topics already used by notes
    /// on the passage follow. A topic reachable both ways appears once,
    /// attributed to the doctrine link.
    pub fn suggest_topics_for_passage(
        &self,
        book: Book,
        chapter: u16,
        verse: Option<u16>,
    ) -> StoreResult<Vec<TopicSuggestion>> {
        let doctrine_ids: Vec<EntryId> = self
            .doctrines_for_passage(book, chapter, verse)?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();
        for topic in self.store.topics_tagged_with(&doctrine_ids)? {
            if seen.insert(topic.id) {
                suggestions.push(TopicSuggestion {
                    topic,
                    source: SuggestionSource::Doctrine,
                });
            }
        }

        for note in self.store.notes_for_passage(book, chapter)? {
            if let Some(v) = verse
                && !note_covers_verse(&note, chapter, v)
            {
                continue;
            }
            let mut topic_ids = Vec::new();
            topic_ids.extend(note.primary_topic_id());
            topic_ids.extend(self.store.note_secondary_topics(note.id())?);
            for topic_id in topic_ids {
                if seen.contains(&topic_id) {
                    continue;
                }
                if let Some(topic) = self.store.get_topic(topic_id)? {
                    seen.insert(topic.id);
                    suggestions.push(TopicSuggestion {
                        topic,
                        source: SuggestionSource::ExistingNotes,
                    });
                }
            }
        }
        Ok(suggestions)
    }
}

/// Whether a note's verse range covers the given verse within `chapter`.
/// Chapter-level notes (no verses) cover everything in their chapters.
fn note_covers_verse(note: &Note, chapter: u16, verse: u16) -> bool {
    let r = note.reference();
    let after_start = r.start_chapter() < chapter
        || r.start_verse().is_none_or(|start| start <= verse);
    let before_end = r.end_chapter() > chapter || r.end_verse().is_none_or(|end| end >= verse);
    after_start && before_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EntryType, NoteId, Reference, ScriptureIndexEntry, TopicId,
    };
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn chapter_entry(chapter: u16, title: &str) -> SystematicEntry {
        SystematicEntry {
            id: EntryId::new(),
            entry_type: EntryType::Chapter,
            part_number: Some(5),
            chapter_number: Some(chapter),
            section_letter: None,
            subsection_number: None,
            title: title.to_string(),
            content: String::new(),
            summary: None,
            parent_id: None,
            sort_order: 0,
        }
    }

    fn edge(
        entry: &SystematicEntry,
        start: Option<u16>,
        end: Option<u16>,
        primary: bool,
    ) -> ScriptureIndexEntry {
        ScriptureIndexEntry {
            systematic_id: entry.id,
            book: Book::from_code("ROM").unwrap(),
            chapter: 3,
            start_verse: start,
            end_verse: end,
            is_primary: primary,
            context_snippet: None,
        }
    }

    fn add_note(store: &mut Store, reference: &str, content: &str, primary: Option<TopicId>) -> Note {
        let note = Note::builder(
            NoteId::new(),
            Reference::parse(reference).unwrap(),
            "a note",
            now(),
            now(),
        )
        .content(content)
        .primary_topic(primary)
        .build()
        .unwrap();
        store.upsert_note(&note, &[]).unwrap();
        note
    }

    #[test]
    fn doctrines_for_passage_filters_by_verse() {
        let mut store = Store::open_in_memory().unwrap();
        let justification = chapter_entry(36, "Justification");
        let sin = chapter_entry(24, "Sin");
        store.upsert_systematic_entry(&justification).unwrap();
        store.upsert_systematic_entry(&sin).unwrap();
        store
            .add_scripture_edge(&edge(&justification, Some(21), Some(26), true))
            .unwrap();
        store
            .add_scripture_edge(&edge(&sin, Some(9), Some(20), false))
            .unwrap();

        let index = DoctrineIndex::new(&store);
        let book = Book::from_code("ROM").unwrap();

        let all = index.doctrines_for_passage(book, 3, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, justification.id, "primary edge ranks first");

        let at_23 = index.doctrines_for_passage(book, 3, Some(23)).unwrap();
        assert_eq!(at_23.len(), 1);
        assert_eq!(at_23[0].id, justification.id);

        assert!(index.doctrines_for_passage(book, 7, None).unwrap().is_empty());
    }

    #[test]
    fn doctrines_for_passage_dedups_entries_with_multiple_edges() {
        let mut store = Store::open_in_memory().unwrap();
        let entry = chapter_entry(36, "Justification");
        store.upsert_systematic_entry(&entry).unwrap();
        store.add_scripture_edge(&edge(&entry, Some(21), Some(22), true)).unwrap();
        store.add_scripture_edge(&edge(&entry, Some(25), Some(26), false)).unwrap();

        let index = DoctrineIndex::new(&store);
        let found = index
            .doctrines_for_passage(Book::from_code("ROM").unwrap(), 3, None)
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn notes_referencing_matches_canonical_token() {
        let mut store = Store::open_in_memory().unwrap();
        let entry = chapter_entry(36, "Justification");
        store.upsert_systematic_entry(&entry).unwrap();

        let linked = add_note(
            &mut store,
            "Romans 3:21-26",
            "Compare [[ST:Ch36]] on this point.",
            None,
        );
        add_note(&mut store, "Romans 5:1", "no links here", None);

        let index = DoctrineIndex::new(&store);
        let found = index.notes_referencing(entry.id).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), linked.id());
    }

    #[test]
    fn notes_referencing_unaddressable_entry_is_empty() {
        let mut store = Store::open_in_memory().unwrap();
        let part = SystematicEntry {
            entry_type: EntryType::Part,
            chapter_number: None,
            ..chapter_entry(0, "The Doctrine of Redemption")
        };
        store.upsert_systematic_entry(&part).unwrap();
        add_note(&mut store, "Romans 3:21", "[[ST:Ch36]]", None);

        let index = DoctrineIndex::new(&store);
        assert!(index.notes_referencing(part.id).unwrap().is_empty());
    }

    #[test]
    fn notes_referencing_missing_entry_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let index = DoctrineIndex::new(&store);
        assert!(matches!(
            index.notes_referencing(EntryId::new()).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[test]
    fn suggestions_prefer_doctrine_provenance() {
        let mut store = Store::open_in_memory().unwrap();
        let entry = chapter_entry(36, "Justification");
        store.upsert_systematic_entry(&entry).unwrap();
        store.add_scripture_edge(&edge(&entry, None, None, true)).unwrap();

        // One topic reachable both ways, one only through a note.
        let tagged = Topic::new(TopicId::new(), "Justification", now())
            .unwrap()
            .with_systematic_tag(entry.id);
        let note_only = Topic::new(TopicId::new(), "Assurance", now()).unwrap();
        store.upsert_topic(&tagged).unwrap();
        store.upsert_topic(&note_only).unwrap();
        add_note(&mut store, "Romans 3:21-26", "", Some(tagged.id));
        add_note(&mut store, "Romans 3:24", "", Some(note_only.id));

        let index = DoctrineIndex::new(&store);
        let book = Book::from_code("ROM").unwrap();
        let suggestions = index.suggest_topics_for_passage(book, 3, None).unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].topic.id, tagged.id);
        assert_eq!(suggestions[0].source, SuggestionSource::Doctrine);
        assert_eq!(suggestions[1].topic.id, note_only.id);
        assert_eq!(suggestions[1].source, SuggestionSource::ExistingNotes);
    }

    #[test]
    fn suggestions_respect_verse_filter_on_notes() {
        let mut store = Store::open_in_memory().unwrap();
        let topic = Topic::new(TopicId::new(), "Assurance", now()).unwrap();
        store.upsert_topic(&topic).unwrap();
        add_note(&mut store, "Romans 3:21-26", "", Some(topic.id));

        let index = DoctrineIndex::new(&store);
        let book = Book::from_code("ROM").unwrap();
        assert_eq!(
            index.suggest_topics_for_passage(book, 3, Some(24)).unwrap().len(),
            1
        );
        assert!(index
            .suggest_topics_for_passage(book, 3, Some(5))
            .unwrap()
            .is_empty());
    }
}
