//! DuckDB backend: executes schema edits and stores the chain state.

use crate::ddl::{quote_ident, render};
use crate::error::{DbError, DbResult};
use duckdb::Connection;
use rv_core::error::StateResult;
use rv_core::{
    ChainStateStore, Dialect, ExecutorError, Revision, SchemaEdit, SchemaExecutor, StateError,
};
use std::path::Path;

/// DuckDB database backend
///
/// Single-threaded: a migration run is sequential and the caller owns the
/// connection for its duration.
pub struct DuckDbBackend {
    conn: Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Executor that runs edits against this database.
    pub fn executor(&self) -> DuckDbExecutor<'_> {
        DuckDbExecutor { conn: &self.conn }
    }

    /// State store backed by `table`, created if missing.
    pub fn state_store(&self, table: &str) -> DbResult<DuckDbStateStore<'_>> {
        ensure_version_table(&self.conn, table)?;
        Ok(DuckDbStateStore {
            conn: &self.conn,
            table: table.to_string(),
        })
    }

    /// State store backed by `table`, or `None` when the table is missing.
    ///
    /// Unlike [`state_store`](Self::state_store) this never creates anything.
    pub fn existing_state_store(&self, table: &str) -> DbResult<Option<DuckDbStateStore<'_>>> {
        if !self.relation_exists(table)? {
            return Ok(None);
        }
        Ok(Some(DuckDbStateStore {
            conn: &self.conn,
            table: table.to_string(),
        }))
    }

    /// Check whether a table exists
    pub fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(name);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of a table, in ordinal order
    pub fn column_names(&self, name: &str) -> DbResult<Vec<String>> {
        let (schema, table) = split_qualified(name);
        let mut stmt = self.conn.prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )?;
        let rows = stmt.query_map(duckdb::params![schema, table], |row| {
            row.get::<_, String>(0)
        })?;
        let columns = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
fn with_transaction<F, T>(conn: &Connection, body: F) -> DbResult<T>
where
    F: FnOnce(&Connection) -> DbResult<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::TransactionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

/// Ensure the version table (and its schema, if qualified) exists.
fn ensure_version_table(conn: &Connection, table: &str) -> DbResult<()> {
    let mut sql = String::new();
    if let Some(pos) = table.rfind('.') {
        sql.push_str(&format!(
            "CREATE SCHEMA IF NOT EXISTS {};\n",
            quote_ident(&table[..pos])
        ));
    }
    sql.push_str(&format!(
        "CREATE TABLE IF NOT EXISTS {} (version_num VARCHAR NOT NULL);",
        quote_ident(table)
    ));
    conn.execute_batch(&sql).map_err(|e| {
        DbError::ExecutionError(format!("failed to create version table {table}: {e}"))
    })
}

/// Runs each edit as DDL on a DuckDB connection.
///
/// The statements of one edit commit together. Edits are not grouped, so a
/// step that fails halfway keeps the edits that already ran.
pub struct DuckDbExecutor<'a> {
    conn: &'a Connection,
}

impl SchemaExecutor for DuckDbExecutor<'_> {
    fn execute(&mut self, edit: &SchemaEdit) -> Result<(), ExecutorError> {
        let statements = render(edit, Dialect::DuckDb);
        with_transaction(self.conn, |conn| {
            for sql in &statements {
                log::debug!("{sql}");
                conn.execute_batch(sql)
                    .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Chain state kept in a one-row version table.
pub struct DuckDbStateStore<'a> {
    conn: &'a Connection,
    table: String,
}

impl DuckDbStateStore<'_> {
    /// Name of the version table
    pub fn table(&self) -> &str {
        &self.table
    }

    fn read(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT version_num FROM {}", quote_ident(&self.table)))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let versions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(versions)
    }
}

impl ChainStateStore for DuckDbStateStore<'_> {
    fn current(&self) -> StateResult<Option<Revision>> {
        let mut versions = self.read().map_err(DbError::into_read)?;
        match versions.len() {
            0 => Ok(None),
            1 => {
                let raw = versions.remove(0);
                Revision::try_new(raw)
                    .map(Some)
                    .ok_or_else(|| StateError::Read(format!("empty revision in {}", self.table)))
            }
            count => Err(StateError::Corrupt { count }),
        }
    }

    fn set(&mut self, revision: Option<&Revision>) -> StateResult<()> {
        let table = quote_ident(&self.table);
        with_transaction(self.conn, |conn| {
            conn.execute(&format!("DELETE FROM {table}"), [])?;
            if let Some(revision) = revision {
                conn.execute(
                    &format!("INSERT INTO {table} (version_num) VALUES (?)"),
                    duckdb::params![revision.as_str()],
                )?;
            }
            Ok(())
        })
        .map_err(DbError::into_write)?;
        log::debug!(
            "Stamped {} at {}",
            self.table,
            rv_core::display_revision(revision)
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
