//! Storage backends for direct writes.
//!
//! The writer talks to storage only through [`Backend`]. Two SQLite adapters
//! implement it:
//!
//! - [`sqlite`] - keys generated by the database on insert
//! - [`sequence`] - keys pre-allocated client-side from a sequence table
//!
//! # Submodules
//!
//! - [`schema`] - Sequence table definition
//! - [`sql`] - Statement text builders

pub mod schema;
pub mod sequence;
pub mod sql;
pub mod sqlite;

pub use sequence::SequencedBackend;
pub use sqlite::SqliteBackend;

use crate::error::{Error, Result};
use crate::model::{ColumnValues, Value};

/// What an INSERT writes.
#[derive(Debug, Clone, Copy)]
pub enum InsertSource<'a> {
    /// Explicit column values.
    Values(&'a ColumnValues),
    /// The backend's "all defaults" fragment, e.g. `DEFAULT VALUES`.
    Fragment(&'a str),
}

/// The storage collaborator consumed by the direct writer.
///
/// Implementations own an open connection. Each method issues at most one
/// statement.
pub trait Backend {
    /// Whether keys for `table` must be fetched before inserting.
    fn prefetch_primary_key(&self, _table: &str) -> bool {
        false
    }

    /// Allocate the next value of `sequence`.
    ///
    /// # Errors
    ///
    /// The default implementation always fails: backends that generate keys
    /// server-side have no sequences to read.
    fn next_sequence_value(&self, sequence: &str) -> Result<Value> {
        Err(Error::UnsupportedOperation(format!(
            "backend does not pre-allocate keys (sequence {sequence})"
        )))
    }

    /// Statement fragment that inserts a row of defaults.
    fn empty_insert_statement_value(&self) -> &str {
        "DEFAULT VALUES"
    }

    /// Insert one row, returning the stored primary-key value if the backend
    /// reports one.
    ///
    /// # Errors
    ///
    /// Returns `StatementFailed` if the backend rejects the row.
    fn execute_insert(
        &self,
        table: &str,
        primary_key: &str,
        source: InsertSource<'_>,
    ) -> Result<Option<Value>>;

    /// Update the row whose `primary_key` equals `key_value`, returning the
    /// number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `StatementFailed` if the backend rejects the update.
    fn execute_update_where(
        &self,
        table: &str,
        primary_key: &str,
        key_value: &Value,
        values: &ColumnValues,
    ) -> Result<usize>;
}
