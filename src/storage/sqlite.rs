//! SQLite backend with database-generated keys.
//!
//! Primary keys left out of an insert are filled by SQLite itself
//! (`INTEGER PRIMARY KEY` rowid aliases or column defaults) and read back
//! with `RETURNING`.

use crate::error::{Error, Result};
use crate::model::{ColumnValues, Value};
use crate::storage::{sql, Backend, InsertSource};
use rusqlite::config::DbConfig;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default busy timeout applied when opening a database file.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite-based backend that lets the database assign keys.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Wrap an already-open connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be configured.
    pub fn new(conn: Connection) -> Result<Self> {
        configure(&conn)?;
        Ok(Self { conn })
    }

    /// Open a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(
            timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        ))?;
        Self::new(conn)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Read the row whose `primary_key` equals `key`.
    ///
    /// # Errors
    ///
    /// Returns `MissingTable` for an unknown table, or `StatementFailed` if
    /// the query is rejected.
    pub fn find(&self, table: &str, primary_key: &str, key: &Value) -> Result<Option<ColumnValues>> {
        let sql = sql::select_by_key_sql(table, primary_key);
        let mut stmt = self.conn.prepare(&sql).map_err(|e| classify(table, e))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        stmt.query_row([key], |row| {
            let mut values = ColumnValues::new();
            for (i, name) in names.iter().enumerate() {
                values.insert(name.clone(), row.get::<_, Value>(i)?);
            }
            Ok(values)
        })
        .optional()
        .map_err(|e| classify(table, e))
    }
}

impl Backend for SqliteBackend {
    fn execute_insert(
        &self,
        table: &str,
        primary_key: &str,
        source: InsertSource<'_>,
    ) -> Result<Option<Value>> {
        let (sql, params): (String, Vec<&Value>) = match source {
            InsertSource::Values(values) => (
                sql::insert_sql(table, values.names(), primary_key),
                values.values().collect(),
            ),
            InsertSource::Fragment(fragment) => {
                (sql::insert_fragment_sql(table, fragment, primary_key), Vec::new())
            }
        };
        debug!(table, sql = %sql, "insert");

        let mut stmt = self.conn.prepare(&sql).map_err(|e| classify(table, e))?;
        stmt.query_row(params_from_iter(params), |row| row.get::<_, Value>(0))
            .optional()
            .map_err(|e| classify(table, e))
    }

    fn execute_update_where(
        &self,
        table: &str,
        primary_key: &str,
        key_value: &Value,
        values: &ColumnValues,
    ) -> Result<usize> {
        let sql = sql::update_sql(table, values.names(), primary_key);
        debug!(table, sql = %sql, key = %key_value, "update");

        let params = values.values().chain(std::iter::once(key_value));
        self.conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| classify(table, e))
    }
}

/// Turn off double-quoted string literals.
///
/// Identifiers are spliced as `"name"`; with DQS on, a misspelled column
/// silently becomes a text constant and `WHERE "pk" = ?` matches every row.
fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DDL, false)?;
    Ok(())
}

/// Sort a SQLite failure into the crate's error kinds.
///
/// Statement-level rejections become `StatementFailed`; an unknown table is
/// `MissingTable`; API misuse and everything outside SQLite itself (bad
/// parameter counts, conversion errors) stay `Database`.
pub(crate) fn classify(table: &str, err: rusqlite::Error) -> Error {
    let statement_message = match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if !matches!(
                failure.code,
                ErrorCode::ApiMisuse | ErrorCode::OutOfMemory | ErrorCode::InternalMalfunction
            ) =>
        {
            Some(message.clone().unwrap_or_else(|| failure.to_string()))
        }
        _ => None,
    };

    match statement_message {
        Some(message) if message.starts_with("no such table") => Error::MissingTable {
            table: table.to_string(),
        },
        Some(message) => Error::StatementFailed {
            table: table.to_string(),
            message,
        },
        None => Error::Database(err),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        })
    }
}
