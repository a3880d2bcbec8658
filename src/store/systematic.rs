//! Systematic-theology repository: hierarchy entries and the scripture
//! index edges that tie them to passages.

use crate::domain::{
    Book, EntryId, EntryType, ParseIdError, ScriptureIndexEntry, SystematicEntry, SystematicRef,
};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::Connection;

const ENTRY_COLUMNS: &str = "id, entry_type, part_number, chapter_number, section_letter, \
                             subsection_number, title, content, summary, parent_id, sort_order";

struct EntryRow {
    id: String,
    entry_type: String,
    part_number: Option<i64>,
    chapter_number: Option<i64>,
    section_letter: Option<String>,
    subsection_number: Option<i64>,
    title: String,
    content: String,
    summary: Option<String>,
    parent_id: Option<String>,
    sort_order: i64,
}

fn read_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        entry_type: row.get(1)?,
        part_number: row.get(2)?,
        chapter_number: row.get(3)?,
        section_letter: row.get(4)?,
        subsection_number: row.get(5)?,
        title: row.get(6)?,
        content: row.get(7)?,
        summary: row.get(8)?,
        parent_id: row.get(9)?,
        sort_order: row.get(10)?,
    })
}

fn to_u16(value: i64) -> StoreResult<u16> {
    u16::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("number {} out of range", value)))
}

fn decode_entry(raw: EntryRow) -> StoreResult<SystematicEntry> {
    let invalid = |e: ParseIdError| StoreError::InvalidData(e.to_string());
    Ok(SystematicEntry {
        id: raw.id.parse().map_err(invalid)?,
        entry_type: raw
            .entry_type
            .parse::<EntryType>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?,
        part_number: raw.part_number.map(to_u16).transpose()?,
        chapter_number: raw.chapter_number.map(to_u16).transpose()?,
        section_letter: raw.section_letter.and_then(|s| s.chars().next()),
        subsection_number: raw.subsection_number.map(to_u16).transpose()?,
        title: raw.title,
        content: raw.content,
        summary: raw.summary,
        parent_id: raw.parent_id.map(|s| s.parse()).transpose().map_err(invalid)?,
        sort_order: raw.sort_order,
    })
}

fn collect_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<SystematicEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<EntryRow> = stmt
        .query_map(params, read_entry_row)?
        .collect::<rusqlite::Result<_>>()?;
    rows.into_iter().map(decode_entry).collect()
}

struct EdgeRow {
    systematic_id: String,
    book: String,
    chapter: i64,
    start_verse: Option<i64>,
    end_verse: Option<i64>,
    is_primary: bool,
    context_snippet: Option<String>,
}

fn read_edge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok(EdgeRow {
        systematic_id: row.get(0)?,
        book: row.get(1)?,
        chapter: row.get(2)?,
        start_verse: row.get(3)?,
        end_verse: row.get(4)?,
        is_primary: row.get(5)?,
        context_snippet: row.get(6)?,
    })
}

fn decode_edge(raw: EdgeRow) -> StoreResult<ScriptureIndexEntry> {
    let book = Book::from_code(&raw.book)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown book code '{}'", raw.book)))?;
    Ok(ScriptureIndexEntry {
        systematic_id: raw
            .systematic_id
            .parse()
            .map_err(|e: ParseIdError| StoreError::InvalidData(e.to_string()))?,
        book,
        chapter: to_u16(raw.chapter)?,
        start_verse: raw.start_verse.map(to_u16).transpose()?,
        end_verse: raw.end_verse.map(to_u16).transpose()?,
        is_primary: raw.is_primary,
        context_snippet: raw.context_snippet,
    })
}

/// Returns whether an entry row exists.
pub(crate) fn entry_exists(conn: &Connection, id: EntryId) -> StoreResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM systematic_entries WHERE id = ?)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl Store {
    /// Inserts or updates a systematic entry. Returns `true` on update.
    pub fn upsert_systematic_entry(&mut self, entry: &SystematicEntry) -> StoreResult<bool> {
        let existed = entry_exists(&self.conn, entry.id)?;
        self.conn.execute(
            "INSERT INTO systematic_entries
                 (id, entry_type, part_number, chapter_number, section_letter,
                  subsection_number, title, content, summary, parent_id, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                 entry_type = excluded.entry_type,
                 part_number = excluded.part_number,
                 chapter_number = excluded.chapter_number,
                 section_letter = excluded.section_letter,
                 subsection_number = excluded.subsection_number,
                 title = excluded.title,
                 content = excluded.content,
                 summary = excluded.summary,
                 parent_id = excluded.parent_id,
                 sort_order = excluded.sort_order",
            rusqlite::params![
                entry.id.to_string(),
                entry.entry_type.as_str(),
                entry.part_number,
                entry.chapter_number,
                entry.section_letter.map(String::from),
                entry.subsection_number,
                entry.title,
                entry.content,
                entry.summary,
                entry.parent_id.map(|id| id.to_string()),
                entry.sort_order,
            ],
        )?;
        Ok(existed)
    }

    /// Retrieves an entry by id.
    pub fn get_systematic_entry(&self, id: EntryId) -> StoreResult<Option<SystematicEntry>> {
        let sql = format!("SELECT {} FROM systematic_entries WHERE id = ?", ENTRY_COLUMNS);
        let mut entries = collect_entries(&self.conn, &sql, [id.to_string()])?;
        Ok(entries.pop())
    }

    /// Resolves a reference string to its entry, if one matches.
    pub fn get_entry_by_ref(&self, r: SystematicRef) -> StoreResult<Option<SystematicEntry>> {
        let (entry_type, sql_tail): (&str, &str) = match (r.section_letter(), r.subsection_number())
        {
            (None, _) => ("chapter", ""),
            (Some(_), None) => ("section", " AND section_letter = ?3"),
            (Some(_), Some(_)) => (
                "subsection",
                " AND section_letter = ?3 AND subsection_number = ?4",
            ),
        };
        let sql = format!(
            "SELECT {} FROM systematic_entries
             WHERE entry_type = ?1 AND chapter_number = ?2{}",
            ENTRY_COLUMNS, sql_tail
        );
        let mut entries = match (r.section_letter(), r.subsection_number()) {
            (None, _) => collect_entries(
                &self.conn,
                &sql,
                rusqlite::params![entry_type, r.chapter_number()],
            )?,
            (Some(letter), None) => collect_entries(
                &self.conn,
                &sql,
                rusqlite::params![entry_type, r.chapter_number(), String::from(letter)],
            )?,
            (Some(letter), Some(number)) => collect_entries(
                &self.conn,
                &sql,
                rusqlite::params![
                    entry_type,
                    r.chapter_number(),
                    String::from(letter),
                    number
                ],
            )?,
        };
        Ok(entries.pop())
    }

    /// Lists all entries in hierarchy order.
    pub fn list_systematic_entries(&self) -> StoreResult<Vec<SystematicEntry>> {
        let sql = format!(
            "SELECT {} FROM systematic_entries
             ORDER BY part_number, chapter_number, section_letter, subsection_number, sort_order",
            ENTRY_COLUMNS
        );
        collect_entries(&self.conn, &sql, [])
    }

    /// Deletes an entry; its scripture index edges go with it.
    pub fn delete_systematic_entry(&mut self, id: EntryId) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM systematic_entries WHERE id = ?", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "systematic entry",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Adds a scripture index edge.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the systematic entry does not exist.
    pub fn add_scripture_edge(&mut self, edge: &ScriptureIndexEntry) -> StoreResult<()> {
        if !entry_exists(&self.conn, edge.systematic_id)? {
            return Err(StoreError::NotFound {
                kind: "systematic entry",
                id: edge.systematic_id.to_string(),
            });
        }
        self.conn.execute(
            "INSERT INTO scripture_index
                 (systematic_id, book, chapter, start_verse, end_verse, is_primary, context_snippet)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                edge.systematic_id.to_string(),
                edge.book.code(),
                edge.chapter,
                edge.start_verse,
                edge.end_verse,
                edge.is_primary,
                edge.context_snippet,
            ],
        )?;
        Ok(())
    }

    /// Lists the scripture edges of one entry, primary first.
    pub fn scripture_edges_for(&self, id: EntryId) -> StoreResult<Vec<ScriptureIndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT systematic_id, book, chapter, start_verse, end_verse, is_primary, context_snippet
             FROM scripture_index
             WHERE systematic_id = ?
             ORDER BY is_primary DESC, book, chapter, start_verse",
        )?;
        let rows: Vec<EdgeRow> = stmt
            .query_map([id.to_string()], read_edge_row)?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter().map(decode_edge).collect()
    }

    /// Lists edge/entry pairs touching a chapter, ordered primary-first and
    /// then by hierarchy position. Verse filtering happens in the engine.
    pub fn edges_for_passage(
        &self,
        book: Book,
        chapter: u16,
    ) -> StoreResult<Vec<(ScriptureIndexEntry, SystematicEntry)>> {
        let sql = format!(
            "SELECT si.systematic_id, si.book, si.chapter, si.start_verse, si.end_verse,
                    si.is_primary, si.context_snippet,
                    {}
             FROM scripture_index si
             JOIN systematic_entries e ON e.id = si.systematic_id
             WHERE si.book = ?1 AND si.chapter = ?2
             ORDER BY si.is_primary DESC, e.chapter_number, e.section_letter,
                      e.subsection_number, e.sort_order",
            // Prefix entry columns with the join alias.
            ENTRY_COLUMNS
                .split(", ")
                .map(|c| format!("e.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<(EdgeRow, EntryRow)> = stmt
            .query_map(rusqlite::params![book.code(), chapter], |row| {
                let edge = read_edge_row(row)?;
                let entry = EntryRow {
                    id: row.get(7)?,
                    entry_type: row.get(8)?,
                    part_number: row.get(9)?,
                    chapter_number: row.get(10)?,
                    section_letter: row.get(11)?,
                    subsection_number: row.get(12)?,
                    title: row.get(13)?,
                    content: row.get(14)?,
                    summary: row.get(15)?,
                    parent_id: row.get(16)?,
                    sort_order: row.get(17)?,
                };
                Ok((edge, entry))
            })?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter()
            .map(|(edge, entry)| Ok((decode_edge(edge)?, decode_entry(entry)?)))
            .collect()
    }
}
