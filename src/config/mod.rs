//! Configuration for the `sneaky` CLI.
//!
//! The library itself takes an open backend and needs no configuration. The
//! CLI resolves which database file to open and how to open it.

use crate::error::{Error, Result};
use crate::storage::sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use std::path::{Path, PathBuf};

/// Environment variable naming the database file.
pub const DB_ENV: &str = "SNEAKY_DB";

/// Environment variable overriding the busy timeout, in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "SNEAKY_BUSY_TIMEOUT_MS";

/// Platform data directory for sneaky, e.g. `~/.local/share/sneaky`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sneaky").map(|d| d.data_dir().to_path_buf())
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag, which clap also fills from `SNEAKY_DB`)
/// 2. `SNEAKY_DB` environment variable
/// 3. `<data dir>/sneaky.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var(DB_ENV) {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    data_dir().map(|dir| dir.join("sneaky.db"))
}

/// Busy timeout for new connections.
///
/// # Errors
///
/// Returns `Config` if `SNEAKY_BUSY_TIMEOUT_MS` is set but not a number.
pub fn busy_timeout_ms() -> Result<u64> {
    match std::env::var(BUSY_TIMEOUT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            Error::Config(format!("{BUSY_TIMEOUT_ENV} must be milliseconds, got '{raw}'"))
        }),
        _ => Ok(DEFAULT_BUSY_TIMEOUT_MS),
    }
}
