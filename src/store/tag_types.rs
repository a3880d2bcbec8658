//! Inline tag-type repository.

use crate::domain::{ParseIdError, TagType, TagTypeId};
use crate::store::{Store, StoreError, StoreResult, parse_timestamp};
use rusqlite::Connection;

fn decode(id: String, name: String, color: Option<String>, created: String) -> StoreResult<TagType> {
    Ok(TagType {
        id: id
            .parse()
            .map_err(|e: ParseIdError| StoreError::InvalidData(e.to_string()))?,
        name,
        color,
        created: parse_timestamp(&created)?,
    })
}

/// Inserts or updates a tag-type row. Returns `true` on update. Runs
/// within the caller's transaction when one is open.
///
/// # Errors
///
/// A name collision with a different id surfaces as a database error from
/// the unique constraint; import treats it as a per-row failure.
pub(crate) fn upsert_tag_type_row(conn: &Connection, tag_type: &TagType) -> StoreResult<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tag_types WHERE id = ?)",
        [tag_type.id.to_string()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO tag_types (id, name, color, created)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             color = excluded.color",
        rusqlite::params![
            tag_type.id.to_string(),
            tag_type.name,
            tag_type.color,
            tag_type.created.to_rfc3339(),
        ],
    )?;
    Ok(existed)
}

impl Store {
    /// Inserts or updates a tag type. Returns `true` on update.
    pub fn upsert_tag_type(&mut self, tag_type: &TagType) -> StoreResult<bool> {
        upsert_tag_type_row(&self.conn, tag_type)
    }

    /// Lists all tag types by name.
    pub fn list_tag_types(&self) -> StoreResult<Vec<TagType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, created FROM tag_types ORDER BY name")?;
        let rows: Vec<(String, String, Option<String>, String)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter()
            .map(|(id, name, color, created)| decode(id, name, color, created))
            .collect()
    }

    /// Deletes a tag type.
    pub fn delete_tag_type(&mut self, id: TagTypeId) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM tag_types WHERE id = ?", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "tag type",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
