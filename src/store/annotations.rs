//! Annotation repository.

use crate::domain::{Annotation, AnnotationId, AnnotationKind, ParseIdError};
use crate::store::{Store, StoreError, StoreResult, parse_timestamp};
use rusqlite::Connection;

struct AnnotationRow {
    id: String,
    systematic_id: String,
    kind: String,
    start_offset: i64,
    end_offset: i64,
    content: Option<String>,
    created: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnotationRow> {
    Ok(AnnotationRow {
        id: row.get(0)?,
        systematic_id: row.get(1)?,
        kind: row.get(2)?,
        start_offset: row.get(3)?,
        end_offset: row.get(4)?,
        content: row.get(5)?,
        created: row.get(6)?,
    })
}

fn to_u32(value: i64) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("offset {} out of range", value)))
}

fn decode(raw: AnnotationRow) -> StoreResult<Annotation> {
    let invalid = |e: ParseIdError| StoreError::InvalidData(e.to_string());
    Ok(Annotation {
        id: raw.id.parse().map_err(invalid)?,
        systematic_id: raw.systematic_id.parse().map_err(invalid)?,
        kind: raw
            .kind
            .parse::<AnnotationKind>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?,
        start_offset: to_u32(raw.start_offset)?,
        end_offset: to_u32(raw.end_offset)?,
        content: raw.content,
        created: parse_timestamp(&raw.created)?,
    })
}

const ANNOTATION_COLUMNS: &str =
    "id, systematic_id, kind, start_offset, end_offset, content, created";

/// Inserts or updates an annotation row. Returns `true` on update. Runs
/// within the caller's transaction when one is open.
pub(crate) fn upsert_annotation_row(conn: &Connection, annotation: &Annotation) -> StoreResult<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM annotations WHERE id = ?)",
        [annotation.id.to_string()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO annotations (id, systematic_id, kind, start_offset, end_offset, content, created)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             systematic_id = excluded.systematic_id,
             kind = excluded.kind,
             start_offset = excluded.start_offset,
             end_offset = excluded.end_offset,
             content = excluded.content",
        rusqlite::params![
            annotation.id.to_string(),
            annotation.systematic_id.to_string(),
            annotation.kind.as_str(),
            annotation.start_offset,
            annotation.end_offset,
            annotation.content,
            annotation.created.to_rfc3339(),
        ],
    )?;
    Ok(existed)
}

impl Store {
    /// Inserts or updates an annotation. Returns `true` on update.
    pub fn upsert_annotation(&mut self, annotation: &Annotation) -> StoreResult<bool> {
        upsert_annotation_row(&self.conn, annotation)
    }

    /// Retrieves an annotation by id.
    pub fn get_annotation(&self, id: AnnotationId) -> StoreResult<Option<Annotation>> {
        let sql = format!("SELECT {} FROM annotations WHERE id = ?", ANNOTATION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<AnnotationRow> = stmt
            .query_map([id.to_string()], read_row)?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter().map(decode).next().transpose()
    }

    /// Lists the annotations anchored to one systematic entry, in document
    /// order.
    pub fn annotations_for_entry(
        &self,
        entry_id: crate::domain::EntryId,
    ) -> StoreResult<Vec<Annotation>> {
        let sql = format!(
            "SELECT {} FROM annotations WHERE systematic_id = ? ORDER BY start_offset, end_offset",
            ANNOTATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<AnnotationRow> = stmt
            .query_map([entry_id.to_string()], read_row)?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter().map(decode).collect()
    }

    /// Lists all annotations.
    pub fn list_annotations(&self) -> StoreResult<Vec<Annotation>> {
        let sql = format!(
            "SELECT {} FROM annotations ORDER BY systematic_id, start_offset",
            ANNOTATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<AnnotationRow> = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter().map(decode).collect()
    }

    /// Deletes an annotation.
    pub fn delete_annotation(&mut self, id: AnnotationId) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM annotations WHERE id = ?", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "annotation",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
