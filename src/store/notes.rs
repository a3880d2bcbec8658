//! Note repository: CRUD plus secondary-topic membership.

use crate::domain::{Book, Note, NoteId, NoteKind, Reference, TopicId};
use crate::store::{Store, StoreError, StoreResult, parse_timestamp};
use rusqlite::Connection;

const NOTE_COLUMNS: &str = "id, book, start_chapter, start_verse, end_chapter, end_verse, \
                            title, content, kind, primary_topic_id, series_id, created, modified";

/// Raw row values, decoded into a [`Note`] outside the rusqlite closure.
struct NoteRow {
    id: String,
    book: String,
    start_chapter: i64,
    start_verse: Option<i64>,
    end_chapter: i64,
    end_verse: Option<i64>,
    title: String,
    content: String,
    kind: String,
    primary_topic_id: Option<String>,
    series_id: Option<String>,
    created: String,
    modified: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        book: row.get(1)?,
        start_chapter: row.get(2)?,
        start_verse: row.get(3)?,
        end_chapter: row.get(4)?,
        end_verse: row.get(5)?,
        title: row.get(6)?,
        content: row.get(7)?,
        kind: row.get(8)?,
        primary_topic_id: row.get(9)?,
        series_id: row.get(10)?,
        created: row.get(11)?,
        modified: row.get(12)?,
    })
}

fn to_u16(value: i64, what: &str) -> StoreResult<u16> {
    u16::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{} {} out of range", what, value)))
}

fn decode(raw: NoteRow) -> StoreResult<Note> {
    let book = Book::from_code(&raw.book)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown book code '{}'", raw.book)))?;
    let start_verse = raw.start_verse.map(|v| to_u16(v, "verse")).transpose()?;
    let end_verse = raw.end_verse.map(|v| to_u16(v, "verse")).transpose()?;
    let reference = Reference::new(
        book,
        to_u16(raw.start_chapter, "chapter")?,
        start_verse,
        to_u16(raw.end_chapter, "chapter")?,
        end_verse,
    )
    .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    let id: NoteId = raw
        .id
        .parse()
        .map_err(|e: crate::domain::ParseIdError| StoreError::InvalidData(e.to_string()))?;
    let kind: NoteKind = raw
        .kind
        .parse()
        .map_err(|e: crate::domain::ParseNoteError| StoreError::InvalidData(e.to_string()))?;
    let primary_topic_id: Option<TopicId> = raw
        .primary_topic_id
        .map(|s| s.parse())
        .transpose()
        .map_err(|e: crate::domain::ParseIdError| StoreError::InvalidData(e.to_string()))?;
    let series_id = raw
        .series_id
        .map(|s| s.parse())
        .transpose()
        .map_err(|e: crate::domain::ParseIdError| StoreError::InvalidData(e.to_string()))?;

    Note::builder(
        id,
        reference,
        raw.title,
        parse_timestamp(&raw.created)?,
        parse_timestamp(&raw.modified)?,
    )
    .content(raw.content)
    .kind(kind)
    .primary_topic(primary_topic_id)
    .series(series_id)
    .build()
    .map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn collect_notes(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Note>> {
    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<NoteRow> = stmt
        .query_map(params, read_row)?
        .collect::<rusqlite::Result<_>>()?;
    rows.into_iter().map(decode).collect()
}

/// Inserts or updates the notes row. Returns `true` when an existing row
/// was updated. Runs within the caller's transaction.
pub(crate) fn upsert_note_row(conn: &Connection, note: &Note) -> StoreResult<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?)",
        [note.id().to_string()],
        |row| row.get(0),
    )?;

    let reference = note.reference();
    conn.execute(
        "INSERT INTO notes (id, book, start_chapter, start_verse, end_chapter, end_verse,
                            title, content, kind, primary_topic_id, series_id, created, modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             book = excluded.book,
             start_chapter = excluded.start_chapter,
             start_verse = excluded.start_verse,
             end_chapter = excluded.end_chapter,
             end_verse = excluded.end_verse,
             title = excluded.title,
             content = excluded.content,
             kind = excluded.kind,
             primary_topic_id = excluded.primary_topic_id,
             series_id = excluded.series_id,
             modified = excluded.modified",
        rusqlite::params![
            note.id().to_string(),
            reference.book().code(),
            reference.start_chapter(),
            reference.start_verse(),
            reference.end_chapter(),
            reference.end_verse(),
            note.title(),
            note.content(),
            note.kind().as_str(),
            note.primary_topic_id().map(|id| id.to_string()),
            note.series_id().map(|id| id.to_string()),
            note.created().to_rfc3339(),
            note.modified().to_rfc3339(),
        ],
    )?;
    Ok(existed)
}

/// Replaces the note's secondary-topic set. Runs within the caller's
/// transaction.
pub(crate) fn replace_note_topics(
    conn: &Connection,
    note_id: NoteId,
    topic_ids: &[TopicId],
) -> StoreResult<()> {
    let id_str = note_id.to_string();
    conn.execute("DELETE FROM note_topics WHERE note_id = ?", [&id_str])?;
    for topic_id in topic_ids {
        conn.execute(
            "INSERT OR IGNORE INTO note_topics (note_id, topic_id) VALUES (?, ?)",
            [&id_str, &topic_id.to_string()],
        )?;
    }
    Ok(())
}

impl Store {
    /// Inserts or updates a note together with its secondary-topic set.
    ///
    /// Returns `true` when an existing note was updated.
    pub fn upsert_note(&mut self, note: &Note, secondary_topics: &[TopicId]) -> StoreResult<bool> {
        let tx = self.transaction()?;
        let updated = upsert_note_row(tx.conn(), note)?;
        replace_note_topics(tx.conn(), note.id(), secondary_topics)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Retrieves a note by id.
    pub fn get_note(&self, id: NoteId) -> StoreResult<Option<Note>> {
        let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
        let mut notes = collect_notes(&self.conn, &sql, [id.to_string()])?;
        Ok(notes.pop())
    }

    /// Returns the note's secondary topic ids.
    pub fn note_secondary_topics(&self, id: NoteId) -> StoreResult<Vec<TopicId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT topic_id FROM note_topics WHERE note_id = ? ORDER BY topic_id")?;
        let ids: Vec<String> = stmt
            .query_map([id.to_string()], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        ids.into_iter()
            .map(|s| {
                s.parse()
                    .map_err(|e: crate::domain::ParseIdError| StoreError::InvalidData(e.to_string()))
            })
            .collect()
    }

    /// Deletes a note; its join rows go with it, topics are never touched.
    pub fn delete_note(&mut self, id: NoteId) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "note",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Lists all notes, newest first.
    pub fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let sql = format!("SELECT {} FROM notes ORDER BY created DESC", NOTE_COLUMNS);
        collect_notes(&self.conn, &sql, [])
    }

    /// Lists notes whose verse range covers the given chapter.
    pub fn notes_for_passage(&self, book: Book, chapter: u16) -> StoreResult<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes
             WHERE book = ?1 AND start_chapter <= ?2 AND end_chapter >= ?2
             ORDER BY start_chapter, start_verse",
            NOTE_COLUMNS
        );
        collect_notes(&self.conn, &sql, rusqlite::params![book.code(), chapter])
    }

    /// Lists notes whose content contains the given literal substring.
    pub fn notes_containing(&self, needle: &str) -> StoreResult<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE instr(content, ?) > 0 ORDER BY created",
            NOTE_COLUMNS
        );
        collect_notes(&self.conn, &sql, [needle])
    }

    /// Full-text search over note titles and content, best match first.
    /// Titles are weighted above body text in the ranking.
    pub fn search_notes(&self, query: &str) -> StoreResult<Vec<Note>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let columns = NOTE_COLUMNS
            .split(", ")
            .map(|c| format!("notes.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {}, -bm25(notes_fts, 5.0, 1.0) AS rank
             FROM notes_fts
             JOIN notes ON notes_fts.rowid = notes.rowid
             WHERE notes_fts MATCH ?1
             ORDER BY rank DESC",
            columns
        );
        collect_notes(&self.conn, &sql, [query])
    }

    /// Returns the total note count.
    pub fn count_notes(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Topic;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_note(title: &str, reference: &str) -> Note {
        Note::builder(
            NoteId::new(),
            Reference::parse(reference).unwrap(),
            title,
            now(),
            now(),
        )
        .content("content")
        .build()
        .unwrap()
    }

    fn store_with_topic(name: &str) -> (Store, TopicId) {
        let mut store = Store::open_in_memory().unwrap();
        let topic = Topic::new(TopicId::new(), name, now()).unwrap();
        store.upsert_topic(&topic).unwrap();
        (store, topic.id)
    }

    #[test]
    fn upsert_and_get_roundtrip() {
        let mut store = Store::open_in_memory().unwrap();
        let note = sample_note("Justification", "Romans 3:21-26");

        let updated = store.upsert_note(&note, &[]).unwrap();
        assert!(!updated, "first upsert is an insert");

        let fetched = store.get_note(note.id()).unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[test]
    fn second_upsert_reports_update() {
        let mut store = Store::open_in_memory().unwrap();
        let note = sample_note("Justification", "Romans 3:21-26");
        store.upsert_note(&note, &[]).unwrap();
        assert!(store.upsert_note(&note, &[]).unwrap());
        assert_eq!(store.count_notes().unwrap(), 1);
    }

    #[test]
    fn get_missing_note_returns_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_note(NoteId::new()).unwrap().is_none());
    }

    #[test]
    fn secondary_topics_are_replaced_on_upsert() {
        let (mut store, topic_a) = store_with_topic("Grace");
        let topic_b = Topic::new(TopicId::new(), "Faith", now()).unwrap();
        store.upsert_topic(&topic_b).unwrap();

        let note = sample_note("Justification", "Romans 3:21-26");
        store.upsert_note(&note, &[topic_a, topic_b.id]).unwrap();
        assert_eq!(store.note_secondary_topics(note.id()).unwrap().len(), 2);

        store.upsert_note(&note, &[topic_b.id]).unwrap();
        assert_eq!(
            store.note_secondary_topics(note.id()).unwrap(),
            vec![topic_b.id]
        );
    }

    #[test]
    fn delete_removes_join_rows_but_not_topics() {
        let (mut store, topic_id) = store_with_topic("Grace");
        let note = sample_note("Justification", "Romans 3:21-26");
        store.upsert_note(&note, &[topic_id]).unwrap();

        store.delete_note(note.id()).unwrap();

        let joins: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM note_topics", [], |row| row.get(0))
            .unwrap();
        assert_eq!(joins, 0);
        assert!(store.get_topic(topic_id).unwrap().is_some());
    }

    #[test]
    fn delete_missing_note_is_not_found() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.delete_note(NoteId::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "note", .. }));
    }

    #[test]
    fn notes_for_passage_covers_multi_chapter_ranges() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .upsert_note(&sample_note("Creation week", "Genesis 1:1-2:3"), &[])
            .unwrap();
        store
            .upsert_note(&sample_note("Fall", "Genesis 3"), &[])
            .unwrap();

        let book = Book::from_code("GEN").unwrap();
        assert_eq!(store.notes_for_passage(book, 1).unwrap().len(), 1);
        assert_eq!(store.notes_for_passage(book, 2).unwrap().len(), 1);
        assert_eq!(store.notes_for_passage(book, 3).unwrap().len(), 1);
        assert_eq!(store.notes_for_passage(book, 4).unwrap().len(), 0);
    }

    #[test]
    fn notes_containing_matches_literal_substring() {
        let mut store = Store::open_in_memory().unwrap();
        let linked = Note::builder(
            NoteId::new(),
            Reference::parse("Romans 3:21-26").unwrap(),
            "Justification",
            now(),
            now(),
        )
        .content("See [[ST:Ch36]] for the doctrine.")
        .build()
        .unwrap();
        store.upsert_note(&linked, &[]).unwrap();
        store
            .upsert_note(&sample_note("Unlinked", "Romans 5:1"), &[])
            .unwrap();

        let found = store.notes_containing("[[ST:Ch36]]").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), linked.id());
    }

    #[test]
    fn search_notes_uses_fts() {
        let mut store = Store::open_in_memory().unwrap();
        let note = Note::builder(
            NoteId::new(),
            Reference::parse("Romans 3:21-26").unwrap(),
            "Justification",
            now(),
            now(),
        )
        .content("the righteousness of God apart from the law")
        .build()
        .unwrap();
        store.upsert_note(&note, &[]).unwrap();

        let hits = store.search_notes("righteousness").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.search_notes("predestination").unwrap().is_empty());
    }
}
