//! Topic repository.
//!
//! Structural mutations (re-parenting, cascade delete) live in
//! [`crate::engine::TopicTaxonomy`]; this module only reads and writes
//! rows.

use crate::domain::{EntryId, ParseIdError, Topic, TopicId};
use crate::store::{Store, StoreError, StoreResult, parse_timestamp};
use rusqlite::Connection;

const TOPIC_COLUMNS: &str =
    "id, name, parent_id, sort_order, systematic_tag_id, created, modified";

struct TopicRow {
    id: String,
    name: String,
    parent_id: Option<String>,
    sort_order: i64,
    systematic_tag_id: Option<String>,
    created: String,
    modified: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TopicRow> {
    Ok(TopicRow {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        sort_order: row.get(3)?,
        systematic_tag_id: row.get(4)?,
        created: row.get(5)?,
        modified: row.get(6)?,
    })
}

fn decode(raw: TopicRow) -> StoreResult<Topic> {
    let invalid = |e: ParseIdError| StoreError::InvalidData(e.to_string());
    let id: TopicId = raw.id.parse().map_err(invalid)?;
    let parent_id: Option<TopicId> = raw.parent_id.map(|s| s.parse()).transpose().map_err(invalid)?;
    let systematic_tag_id: Option<EntryId> = raw
        .systematic_tag_id
        .map(|s| s.parse())
        .transpose()
        .map_err(invalid)?;
    Ok(Topic {
        id,
        name: raw.name,
        parent_id,
        sort_order: raw.sort_order,
        systematic_tag_id,
        created: parse_timestamp(&raw.created)?,
        modified: parse_timestamp(&raw.modified)?,
    })
}

fn collect_topics(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Topic>> {
    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<TopicRow> = stmt
        .query_map(params, read_row)?
        .collect::<rusqlite::Result<_>>()?;
    rows.into_iter().map(decode).collect()
}

/// Inserts or updates a topic row. Returns `true` on update. Runs within
/// the caller's transaction when one is open.
pub(crate) fn upsert_topic_row(conn: &Connection, topic: &Topic) -> StoreResult<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM topics WHERE id = ?)",
        [topic.id.to_string()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO topics (id, name, parent_id, sort_order, systematic_tag_id, created, modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             parent_id = excluded.parent_id,
             sort_order = excluded.sort_order,
             systematic_tag_id = excluded.systematic_tag_id,
             modified = excluded.modified",
        rusqlite::params![
            topic.id.to_string(),
            topic.name,
            topic.parent_id.map(|id| id.to_string()),
            topic.sort_order,
            topic.systematic_tag_id.map(|id| id.to_string()),
            topic.created.to_rfc3339(),
            topic.modified.to_rfc3339(),
        ],
    )?;
    Ok(existed)
}

/// Returns whether a topic row exists.
pub(crate) fn topic_exists(conn: &Connection, id: TopicId) -> StoreResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM topics WHERE id = ?)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl Store {
    /// Inserts or updates a topic. Returns `true` when an existing topic
    /// was updated.
    pub fn upsert_topic(&mut self, topic: &Topic) -> StoreResult<bool> {
        upsert_topic_row(&self.conn, topic)
    }

    /// Retrieves a topic by id.
    pub fn get_topic(&self, id: TopicId) -> StoreResult<Option<Topic>> {
        let sql = format!("SELECT {} FROM topics WHERE id = ?", TOPIC_COLUMNS);
        let mut topics = collect_topics(&self.conn, &sql, [id.to_string()])?;
        Ok(topics.pop())
    }

    /// Lists all topics ordered by sort order, then name.
    pub fn list_topics(&self) -> StoreResult<Vec<Topic>> {
        let sql = format!(
            "SELECT {} FROM topics ORDER BY sort_order, name",
            TOPIC_COLUMNS
        );
        collect_topics(&self.conn, &sql, [])
    }

    /// Lists the direct children of a topic, ordered by sort order, then
    /// name.
    pub fn topic_children(&self, id: TopicId) -> StoreResult<Vec<Topic>> {
        let sql = format!(
            "SELECT {} FROM topics WHERE parent_id = ? ORDER BY sort_order, name",
            TOPIC_COLUMNS
        );
        collect_topics(&self.conn, &sql, [id.to_string()])
    }

    /// Finds a topic by exact name.
    pub fn find_topic_by_name(&self, name: &str) -> StoreResult<Option<Topic>> {
        let sql = format!("SELECT {} FROM topics WHERE name = ?", TOPIC_COLUMNS);
        let mut topics = collect_topics(&self.conn, &sql, [name])?;
        Ok(topics.pop())
    }

    /// Lists topics cross-linked to any of the given systematic entries.
    pub fn topics_tagged_with(&self, entry_ids: &[EntryId]) -> StoreResult<Vec<Topic>> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; entry_ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM topics WHERE systematic_tag_id IN ({}) ORDER BY sort_order, name",
            TOPIC_COLUMNS, placeholders
        );
        let params: Vec<String> = entry_ids.iter().map(|id| id.to_string()).collect();
        collect_topics(
            &self.conn,
            &sql,
            rusqlite::params_from_iter(params.iter()),
        )
    }
}
