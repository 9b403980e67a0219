//! SQLite backend with client-side key pre-allocation.
//!
//! Mirrors databases that hand out keys from sequences before the insert
//! runs. Every table's keys come from the sequence named by its
//! [`TableRef`](crate::model::TableRef); sequences are created on first use
//! and start at 1.

use crate::error::Result;
use crate::model::{ColumnValues, Value};
use crate::storage::schema::{apply_schema, SEQUENCES_TABLE};
use crate::storage::sqlite::{classify, SqliteBackend};
use crate::storage::{Backend, InsertSource};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

const NEXT_VALUE_SQL: &str = "INSERT INTO sneaky_sequences (name, last_value) VALUES (?1, 1)
     ON CONFLICT(name) DO UPDATE SET last_value = last_value + 1
     RETURNING last_value";

/// Backend that pre-allocates every primary key from a sequence.
#[derive(Debug)]
pub struct SequencedBackend {
    inner: SqliteBackend,
}

impl SequencedBackend {
    /// Wrap an open connection, creating the sequence table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence table cannot be created.
    pub fn new(conn: Connection) -> Result<Self> {
        let inner = SqliteBackend::new(conn)?;
        apply_schema(inner.connection())?;
        Ok(Self { inner })
    }

    /// Open a database file with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let inner = SqliteBackend::open_with_timeout(path, timeout_ms)?;
        apply_schema(inner.connection())?;
        Ok(Self { inner })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema fails.
    pub fn open_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// The wrapped auto-key backend, for reads.
    #[must_use]
    pub fn sqlite(&self) -> &SqliteBackend {
        &self.inner
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        self.inner.connection()
    }
}

impl Backend for SequencedBackend {
    fn prefetch_primary_key(&self, _table: &str) -> bool {
        true
    }

    fn next_sequence_value(&self, sequence: &str) -> Result<Value> {
        let next: i64 = self
            .connection()
            .query_row(NEXT_VALUE_SQL, [sequence], |row| row.get(0))
            .map_err(|e| classify(SEQUENCES_TABLE, e))?;
        debug!(sequence, next, "sequence advanced");
        Ok(Value::Integer(next))
    }

    fn empty_insert_statement_value(&self) -> &str {
        self.inner.empty_insert_statement_value()
    }

    fn execute_insert(
        &self,
        table: &str,
        primary_key: &str,
        source: InsertSource<'_>,
    ) -> Result<Option<Value>> {
        self.inner.execute_insert(table, primary_key, source)
    }

    fn execute_update_where(
        &self,
        table: &str,
        primary_key: &str,
        key_value: &Value,
        values: &ColumnValues,
    ) -> Result<usize> {
        self.inner
            .execute_update_where(table, primary_key, key_value, values)
    }
}
