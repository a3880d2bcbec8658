//! Sermon series repository.

use crate::domain::{ParseIdError, Series, SeriesId};
use crate::store::{Store, StoreError, StoreResult, parse_timestamp};
use rusqlite::Connection;

fn decode(
    id: String,
    name: String,
    description: Option<String>,
    created: String,
) -> StoreResult<Series> {
    Ok(Series {
        id: id
            .parse()
            .map_err(|e: ParseIdError| StoreError::InvalidData(e.to_string()))?,
        name,
        description,
        created: parse_timestamp(&created)?,
    })
}

/// Inserts or updates a series row. Returns `true` on update. Runs within
/// the caller's transaction when one is open.
pub(crate) fn upsert_series_row(conn: &Connection, series: &Series) -> StoreResult<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM series WHERE id = ?)",
        [series.id.to_string()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO series (id, name, description, created)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description",
        rusqlite::params![
            series.id.to_string(),
            series.name,
            series.description,
            series.created.to_rfc3339(),
        ],
    )?;
    Ok(existed)
}

impl Store {
    /// Inserts or updates a series. Returns `true` on update.
    pub fn upsert_series(&mut self, series: &Series) -> StoreResult<bool> {
        upsert_series_row(&self.conn, series)
    }

    /// Retrieves a series by id.
    pub fn get_series(&self, id: SeriesId) -> StoreResult<Option<Series>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created FROM series WHERE id = ?")?;
        let rows: Vec<(String, String, Option<String>, String)> = stmt
            .query_map([id.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter()
            .map(|(id, name, description, created)| decode(id, name, description, created))
            .next()
            .transpose()
    }

    /// Lists all series by name.
    pub fn list_series(&self) -> StoreResult<Vec<Series>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created FROM series ORDER BY name")?;
        let rows: Vec<(String, String, Option<String>, String)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter()
            .map(|(id, name, description, created)| decode(id, name, description, created))
            .collect()
    }

    /// Deletes a series. Sermon notes keep their dangling pointer; the
    /// snapshot format preserves it for a later re-import of the series.
    pub fn delete_series(&mut self, id: SeriesId) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM series WHERE id = ?", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "series",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
