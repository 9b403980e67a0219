//! Show command implementation.

use crate::cli::commands::{parse_key, Store};
use crate::cli::ShowArgs;
use crate::error::{Error, Result};
use colored::Colorize;
use std::path::PathBuf;

/// Execute the show command.
///
/// # Errors
///
/// Returns `RecordNotFound` if no row has the key.
pub fn execute(args: &ShowArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = Store::open(db_path, false)?;
    let row = store
        .sqlite()
        .find(&args.table, &args.pk, &parse_key(&args.id))?
        .ok_or_else(|| Error::RecordNotFound {
            table: args.table.clone(),
            id: args.id.clone(),
        })?;

    if json {
        println!("{}", serde_json::to_string(&row)?);
        return Ok(());
    }

    let width = row.names().map(str::len).max().unwrap_or(0);
    for (column, value) in row.iter() {
        println!("{}  {value}", format!("{column:>width$}").bold());
    }
    Ok(())
}
