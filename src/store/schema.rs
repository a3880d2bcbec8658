//! SQLite schema creation for the study database.

use rusqlite::Connection;

/// Creates the database schema.
///
/// Idempotent; calling it on an already-initialized database is safe.
///
/// # Tables
/// - `notes` - user annotations on verse ranges
/// - `note_topics` - secondary topic membership (primary membership is the
///   `primary_topic_id` column on `notes`)
/// - `topics` - parent-pointer taxonomy nodes
/// - `systematic_entries` - four-level theology hierarchy
/// - `scripture_index` - entry-to-passage edges
/// - `annotations` - highlights/notes on entry content
/// - `series` - sermon series
/// - `tag_types` - inline tag-type definitions
/// - `schema_version` - version tracking
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS topics (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            systematic_tag_id TEXT,
            created TEXT NOT NULL,
            modified TEXT NOT NULL
        );",
    )?;

    // primary_topic_id and series_id carry no FK constraint: they are soft
    // references cleared (not cascaded) when their target goes away
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            book TEXT NOT NULL,
            start_chapter INTEGER NOT NULL,
            start_verse INTEGER,
            end_chapter INTEGER NOT NULL,
            end_verse INTEGER,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            kind TEXT NOT NULL,
            primary_topic_id TEXT,
            series_id TEXT,
            created TEXT NOT NULL,
            modified TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS note_topics (
            note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            topic_id TEXT NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            PRIMARY KEY (note_id, topic_id)
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS systematic_entries (
            id TEXT PRIMARY KEY,
            entry_type TEXT NOT NULL,
            part_number INTEGER,
            chapter_number INTEGER,
            section_letter TEXT,
            subsection_number INTEGER,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            summary TEXT,
            parent_id TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS scripture_index (
            id INTEGER PRIMARY KEY,
            systematic_id TEXT NOT NULL REFERENCES systematic_entries(id) ON DELETE CASCADE,
            book TEXT NOT NULL,
            chapter INTEGER NOT NULL,
            start_verse INTEGER,
            end_verse INTEGER,
            is_primary INTEGER NOT NULL DEFAULT 0,
            context_snippet TEXT
        );",
    )?;

    // No FK to systematic_entries: annotations have an independent
    // lifecycle and may be restored before (or without) theology content
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS annotations (
            id TEXT PRIMARY KEY,
            systematic_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            start_offset INTEGER NOT NULL,
            end_offset INTEGER NOT NULL,
            content TEXT,
            created TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS series (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            created TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tag_types (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT,
            created TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_notes_passage ON notes(book, start_chapter);
         CREATE INDEX IF NOT EXISTS idx_notes_primary_topic ON notes(primary_topic_id);
         CREATE INDEX IF NOT EXISTS idx_notes_series ON notes(series_id);
         CREATE INDEX IF NOT EXISTS idx_topics_parent ON topics(parent_id);
         CREATE INDEX IF NOT EXISTS idx_scripture_passage ON scripture_index(book, chapter);
         CREATE INDEX IF NOT EXISTS idx_annotations_entry ON annotations(systematic_id);",
    )?;

    // Full-text search over note text is delegated to FTS5
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
            title,
            content,
            content='notes',
            content_rowid='rowid'
        );",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS notes_fts_insert
        AFTER INSERT ON notes BEGIN
            INSERT INTO notes_fts(rowid, title, content)
            VALUES (NEW.rowid, NEW.title, NEW.content);
        END;",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS notes_fts_delete
        AFTER DELETE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, content)
            VALUES ('delete', OLD.rowid, OLD.title, OLD.content);
        END;",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS notes_fts_update
        AFTER UPDATE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, content)
            VALUES ('delete', OLD.rowid, OLD.title, OLD.content);
            INSERT INTO notes_fts(rowid, title, content)
            VALUES (NEW.rowid, NEW.title, NEW.content);
        END;",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
        [],
    )?;

    Ok(())
}

/// Returns the current schema version.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}

/// Rebuilds the FTS index from the notes table, for recovery after bulk
/// operations that bypass the triggers.
pub fn rebuild_fts(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("INSERT INTO notes_fts(notes_fts) VALUES('rebuild')", [])?;
    Ok(())
}
