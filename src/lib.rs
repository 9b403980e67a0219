//! sneaky-save: write records straight to SQL.
//!
//! A record is persisted with exactly one INSERT or UPDATE. No callbacks,
//! no validations, and no dirty-tracking side effects.
//!
//! # Architecture
//!
//! - [`writer`] - The direct writer and the [`DirectWrite`] extension trait
//! - [`model`] - Values, column maps and the [`model::Record`] trait
//! - [`storage`] - The [`storage::Backend`] trait and SQLite adapters
//! - [`config`] - Database path resolution for the CLI
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod writer;

pub use error::{Error, Result};
pub use writer::{DirectWrite, DirectWriter};

/// Global quiet flag for `--quiet`.
///
/// When set, commands skip human-readable output. JSON output and errors
/// are still printed.
pub static QUIET: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if quiet mode is active.
#[inline]
pub fn is_quiet() -> bool {
    QUIET.load(std::sync::atomic::Ordering::Relaxed)
}
