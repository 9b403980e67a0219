//! Insert and update command implementations.

use crate::cli::commands::{parse_key, Store};
use crate::cli::{InsertArgs, UpdateArgs};
use crate::error::{Error, Result};
use crate::model::{ColumnValues, DynamicRecord, Record, TableRef, Value};
use crate::writer::DirectWriter;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Output for insert and update.
#[derive(Serialize)]
struct WriteOutput<'a> {
    saved: bool,
    table: &'a str,
    id: Value,
    record: &'a DynamicRecord,
}

/// Execute the insert command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the input is not a
/// JSON object, or (with `--strict`) the insert is rejected.
pub fn execute_insert(
    args: &InsertArgs,
    db_path: Option<&PathBuf>,
    sequences: bool,
    json: bool,
) -> Result<()> {
    let input: serde_json::Value = serde_json::from_str(&args.values)?;
    let values = ColumnValues::from_json(&input)?;
    let store = Store::open(db_path, sequences)?;

    let mut table = TableRef::new(&args.table);
    if let Some(sequence) = &args.sequence {
        table = table.with_sequence(sequence);
    }

    let mut record = DynamicRecord::new(table, &args.pk);
    if let Some(id) = &args.id {
        record.set(&args.pk, parse_key(id));
    }
    for (column, value) in values {
        record.set(column, value);
    }

    let saved = save(&store, &mut record, args.strict)?;
    info!(table = %args.table, saved, "Insert finished");
    print_result(saved, &args.table, &record, "inserted", json)
}

/// Execute the update command.
///
/// # Errors
///
/// Returns `RecordNotFound` if no row has the key, or (with `--strict`) the
/// backend's rejection of the update.
pub fn execute_update(args: &UpdateArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let input: serde_json::Value = serde_json::from_str(&args.set)?;
    let changes = ColumnValues::from_json(&input)?;
    // Updates never allocate keys, so the sequence table is left alone.
    let store = Store::open(db_path, false)?;

    let key = parse_key(&args.id);
    let row = store
        .sqlite()
        .find(&args.table, &args.pk, &key)?
        .ok_or_else(|| Error::RecordNotFound {
            table: args.table.clone(),
            id: args.id.clone(),
        })?;

    let mut record = DynamicRecord::loaded(TableRef::new(&args.table), &args.pk, row);
    for (column, value) in changes {
        record.set(column, value);
    }

    let saved = save(&store, &mut record, args.strict)?;
    info!(table = %args.table, saved, "Update finished");
    print_result(saved, &args.table, &record, "updated", json)
}

fn save(store: &Store, record: &mut DynamicRecord, strict: bool) -> Result<bool> {
    let writer = DirectWriter::new(store.backend());
    if strict {
        writer.write_or_fail(record)
    } else {
        writer.write_best_effort(record)
    }
}

fn print_result(
    saved: bool,
    table: &str,
    record: &DynamicRecord,
    verb: &str,
    json: bool,
) -> Result<()> {
    let id = record.primary_key_value();

    if json {
        let output = WriteOutput {
            saved,
            table,
            id,
            record,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if crate::is_quiet() {
        return Ok(());
    }

    if saved {
        println!("{} {verb} {table} {}={id}", "✓".green(), record.primary_key_column());
    } else {
        println!("{} not saved ({table})", "✗".yellow());
    }
    Ok(())
}
