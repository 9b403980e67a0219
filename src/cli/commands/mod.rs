//! Command implementations.

pub mod show;
pub mod version;
pub mod write;

use crate::config::{busy_timeout_ms, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::Value;
use crate::storage::{Backend, SequencedBackend, SqliteBackend};
use std::path::PathBuf;
use tracing::info;

/// The backend picked by `--sequences`.
pub(crate) enum Store {
    Auto(SqliteBackend),
    Sequenced(SequencedBackend),
}

impl Store {
    /// Open an existing database file.
    pub(crate) fn open(db_path: Option<&PathBuf>, sequences: bool) -> Result<Self> {
        let path = resolve_db_path(db_path.map(PathBuf::as_path))
            .ok_or_else(|| Error::Config("could not determine a database path".to_string()))?;

        if !path.exists() {
            return Err(Error::Config(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        let timeout = Some(busy_timeout_ms()?);
        info!(path = %path.display(), sequences, "Opening database");
        Ok(if sequences {
            Self::Sequenced(SequencedBackend::open_with_timeout(&path, timeout)?)
        } else {
            Self::Auto(SqliteBackend::open_with_timeout(&path, timeout)?)
        })
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        match self {
            Self::Auto(b) => b as &dyn Backend,
            Self::Sequenced(b) => b,
        }
    }

    pub(crate) fn sqlite(&self) -> &SqliteBackend {
        match self {
            Self::Auto(b) => b,
            Self::Sequenced(b) => b.sqlite(),
        }
    }
}

/// Parse a key given on the command line: JSON literal, else bare text.
pub(crate) fn parse_key(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| Value::Text(raw.to_string()), |v| Value::from_json(&v))
}
