//! Error types for direct writes.
//!
//! Provides:
//! - A single swallowable kind (`StatementFailed`) for rejected statements
//! - Machine-readable error codes (`ErrorCode`) and category exit codes
//! - Recovery hints and structured JSON output for the CLI

use thiserror::Error;

/// Result type alias for sneaky-save operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Statement (exit 2)
    StatementFailed,
    DatabaseError,

    // Not Found (exit 3)
    MissingTable,
    RecordNotFound,

    // Usage (exit 4)
    InvalidArgument,
    UnsupportedOperation,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StatementFailed => "STATEMENT_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::MissingTable => "MISSING_TABLE",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::StatementFailed | Self::DatabaseError => 2,
            Self::MissingTable | Self::RecordNotFound => 3,
            Self::InvalidArgument | Self::UnsupportedOperation => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors raised by the writer, the storage adapters and the CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// The backend rejected the statement: constraint violation, type
    /// mismatch, locked or unreachable database.
    #[error("Statement failed on {table}: {message}")]
    StatementFailed { table: String, message: String },

    #[error("No such table: {table}")]
    MissingTable { table: String },

    #[error("No row in {table} with key {id}")]
    RecordNotFound { table: String, id: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is a backend statement rejection.
    ///
    /// Best-effort writes turn exactly these into `false`.
    #[must_use]
    pub const fn is_statement_failure(&self) -> bool {
        matches!(self, Self::StatementFailed { .. })
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::StatementFailed { .. } => ErrorCode::StatementFailed,
            Self::MissingTable { .. } => ErrorCode::MissingTable,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint, if one applies.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingTable { table } => Some(format!(
                "Create the `{table}` table first; sneaky never creates schema."
            )),
            Self::RecordNotFound { table, .. } => Some(format!(
                "Check the key, or pass --pk if `{table}` does not use `id`."
            )),
            Self::StatementFailed { .. } => {
                Some("Drop --strict to get a best-effort `saved: false` instead.".to_string())
            }
            Self::UnsupportedOperation(_) => {
                Some("Pass --sequences to pre-allocate keys from a sequence.".to_string())
            }
            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
