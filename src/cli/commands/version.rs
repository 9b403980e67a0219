//! Version command implementation.

use crate::config::resolve_db_path;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct VersionOutput {
    version: &'static str,
    sqlite: &'static str,
    database: Option<String>,
}

/// Print the crate version, the linked SQLite library, and the database the
/// other commands would open.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let output = VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        sqlite: rusqlite::version(),
        database: resolve_db_path(db_path.map(PathBuf::as_path))
            .map(|path| path.display().to_string()),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("sneaky {} (SQLite {})", output.version, output.sqlite);
    match &output.database {
        Some(path) => println!("  {} {path}", "database:".dimmed()),
        None => println!("  {} {}", "database:".dimmed(), "unresolved".yellow()),
    }
    Ok(())
}
