//! RAII transaction support.

use crate::store::StoreResult;
use rusqlite::{Connection, Params};

/// A database transaction that rolls back automatically when dropped,
/// unless `commit()` is called first.
pub struct Transaction<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            finished: false,
        }
    }

    /// Returns the underlying connection for statements within the
    /// transaction.
    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    /// Executes a SQL statement within the transaction.
    pub fn execute(&self, sql: &str, params: impl Params) -> StoreResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Commits the transaction, consuming it.
    pub fn commit(mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    /// Rolls back explicitly. Equivalent to dropping without commit, but
    /// makes the intent visible at the call site.
    pub fn rollback(mut self) -> StoreResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        self.finished = true;
        Ok(())
    }

    /// Runs `f` inside a named savepoint. When `f` fails, only the
    /// statements it issued are rolled back; the outer transaction stays
    /// open and keeps everything written before the savepoint.
    ///
    /// `name` is interpolated into the SQL and must be a plain
    /// identifier; callers pass literals.
    pub fn savepoint<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        match f(self.conn) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {}", name))?;
                Ok(value)
            }
            Err(e) => {
                // Best effort; the row error is the one worth reporting
                let _ = self
                    .conn
                    .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", name));
                Err(e)
            }
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // Best effort; nothing useful to do with a failure in drop
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{Store, StoreError, StoreResult};
    use pretty_assertions::assert_eq;

    fn insert_series(conn: &rusqlite::Connection, id: &str, name: &str) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO series (id, name, created) VALUES (?, ?, '2024-01-15T10:30:00Z')",
            [id, name],
        )?;
        Ok(())
    }

    fn series_count(store: &Store) -> i64 {
        store
            .conn()
            .query_row("SELECT COUNT(*) FROM series", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn failed_savepoint_keeps_earlier_writes() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        insert_series(tx.conn(), "S1", "Romans").unwrap();

        let result: StoreResult<()> = tx.savepoint("row", |conn| {
            insert_series(conn, "S2", "Galatians")?;
            Err(StoreError::InvalidData("bad row".to_string()))
        });
        assert!(result.is_err());
        tx.commit().unwrap();

        assert_eq!(series_count(&store), 1, "only the pre-savepoint row commits");
    }

    #[test]
    fn successful_savepoint_is_released_and_commits() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();

        tx.savepoint("row", |conn| insert_series(conn, "S1", "Romans"))
            .unwrap();
        tx.savepoint("row", |conn| insert_series(conn, "S2", "Galatians"))
            .unwrap();
        tx.commit().unwrap();

        assert_eq!(series_count(&store), 2);
    }

    #[test]
    fn dropping_without_commit_rolls_back_savepoint_writes() {
        let mut store = Store::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            tx.savepoint("row", |conn| insert_series(conn, "S1", "Romans"))
                .unwrap();
        }
        assert_eq!(series_count(&store), 0);
    }
}
