//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Write rows straight to SQLite, skipping every hook
#[derive(Parser, Debug)]
#[command(name = "sneaky", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: platform data dir, sneaky.db)
    #[arg(long, global = true, env = "SNEAKY_DB")]
    pub db: Option<PathBuf>,

    /// Pre-allocate insert keys from sequences instead of letting SQLite assign them
    #[arg(long, global = true)]
    pub sequences: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert a new row
    Insert(InsertArgs),

    /// Update an existing row
    Update(UpdateArgs),

    /// Print a row
    Show(ShowArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Table to insert into
    pub table: String,

    /// Column values as a JSON object, e.g. '{"name":"ada"}'
    #[arg(long)]
    pub values: String,

    /// Primary-key column
    #[arg(long, default_value = "id")]
    pub pk: String,

    /// Explicit primary-key value (JSON literal or bare text)
    #[arg(long)]
    pub id: Option<String>,

    /// Sequence to draw keys from (default: <table>_seq)
    #[arg(long)]
    pub sequence: Option<String>,

    /// Fail with an error instead of reporting `saved: false`
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Table holding the row
    pub table: String,

    /// Primary-key value of the row (JSON literal or bare text)
    pub id: String,

    /// Columns to change as a JSON object
    #[arg(long)]
    pub set: String,

    /// Primary-key column
    #[arg(long, default_value = "id")]
    pub pk: String,

    /// Fail with an error instead of reporting `saved: false`
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Table holding the row
    pub table: String,

    /// Primary-key value of the row
    pub id: String,

    /// Primary-key column
    #[arg(long, default_value = "id")]
    pub pk: String,
}
