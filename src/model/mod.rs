//! Data model for direct writes.
//!
//! This module contains:
//! - Value (a single column cell)
//! - ColumnValues / Changes (ordered column maps)
//! - TableRef (table plus key sequence)
//! - Record (the capability trait) and DynamicRecord

pub mod columns;
pub mod record;
pub mod value;

pub use columns::{Change, Changes, ColumnValues, TableRef};
pub use record::{DynamicRecord, Record};
pub use value::Value;
