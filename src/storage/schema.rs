//! Bookkeeping schema for emulated sequences.
//!
//! SQLite has no sequence objects, so the sequenced backend keeps one row per
//! sequence holding the last value handed out.

use rusqlite::{Connection, Result};

/// Table holding sequence state.
pub const SEQUENCES_TABLE: &str = "sneaky_sequences";

/// DDL for the sequence table.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS sneaky_sequences (
    name TEXT PRIMARY KEY,
    last_value INTEGER NOT NULL
);
";

/// Apply the sequence schema. Idempotent.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
