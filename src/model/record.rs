//! The record capability interface and a change-tracking implementation.

use crate::model::{ColumnValues, Changes, TableRef, Value};
use serde::Serialize;

/// What the direct writer needs from a persisted entity.
///
/// `column_names` and `column_values` are the override points for types that
/// want a different set of columns to participate in persistence than their
/// full attribute map.
pub trait Record {
    /// Table the record is stored in.
    fn table(&self) -> TableRef;

    /// Name of the primary-key column.
    fn primary_key_column(&self) -> &str;

    /// True until the record has been inserted.
    fn is_new(&self) -> bool;

    fn set_new(&mut self, new: bool);

    /// All current column values.
    fn attributes(&self) -> ColumnValues;

    /// Columns changed since the record was loaded.
    fn changes(&self) -> Changes;

    fn set_primary_key_value(&mut self, value: Value);

    /// Current primary-key value, `Value::Null` when absent.
    fn primary_key_value(&self) -> Value {
        self.attributes()
            .get(self.primary_key_column())
            .cloned()
            .unwrap_or_default()
    }

    /// Columns used when building an insert.
    fn column_names(&self) -> Vec<String> {
        self.attributes().names().map(str::to_string).collect()
    }

    /// Values persisted by inserts and updates.
    fn column_values(&self) -> ColumnValues {
        self.attributes()
    }
}

/// A schemaless record backed by an ordered column map.
#[derive(Debug, Clone, Serialize)]
pub struct DynamicRecord {
    #[serde(skip)]
    table: TableRef,
    #[serde(skip)]
    primary_key: String,
    #[serde(skip)]
    new_record: bool,
    #[serde(skip)]
    changes: Changes,
    #[serde(skip)]
    column_names: Option<Vec<String>>,
    #[serde(flatten)]
    attributes: ColumnValues,
}

impl DynamicRecord {
    /// Create a new record with no row behind it.
    #[must_use]
    pub fn new(table: TableRef, primary_key: impl Into<String>) -> Self {
        Self {
            table,
            primary_key: primary_key.into(),
            new_record: true,
            changes: Changes::new(),
            column_names: None,
            attributes: ColumnValues::new(),
        }
    }

    /// Wrap a row that already exists in storage.
    #[must_use]
    pub fn loaded(table: TableRef, primary_key: impl Into<String>, attributes: ColumnValues) -> Self {
        Self {
            table,
            primary_key: primary_key.into(),
            new_record: false,
            changes: Changes::new(),
            column_names: None,
            attributes,
        }
    }

    /// Restrict the columns that take part in inserts and updates.
    #[must_use]
    pub fn with_column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set a column value.
    ///
    /// New records never track changes. For loaded records, assigning a
    /// column back to its loaded value drops the pending change.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        if !self.new_record {
            let old = match self.changes.get(&column) {
                Some(change) => change.old.clone(),
                None => self.attributes.get(&column).cloned().unwrap_or_default(),
            };
            if old == value {
                self.changes.remove(&column);
            } else {
                self.changes.record(column.clone(), old, value.clone());
            }
        }
        self.attributes.insert(column, value);
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// Forget pending changes, treating the current values as loaded.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }
}

impl Record for DynamicRecord {
    fn table(&self) -> TableRef {
        self.table.clone()
    }

    fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    fn is_new(&self) -> bool {
        self.new_record
    }

    fn set_new(&mut self, new: bool) {
        self.new_record = new;
    }

    fn attributes(&self) -> ColumnValues {
        self.attributes.clone()
    }

    fn changes(&self) -> Changes {
        self.changes.clone()
    }

    fn set_primary_key_value(&mut self, value: Value) {
        self.attributes.insert(self.primary_key.clone(), value);
    }

    fn column_names(&self) -> Vec<String> {
        match &self.column_names {
            Some(names) => names.clone(),
            None => self.attributes.names().map(str::to_string).collect(),
        }
    }

    fn column_values(&self) -> ColumnValues {
        match &self.column_names {
            Some(names) => self
                .attributes
                .iter()
                .filter(|(c, _)| names.iter().any(|n| n.as_str() == *c))
                .map(|(c, v)| (c.to_string(), v.clone()))
                .collect(),
            None => self.attributes.clone(),
        }
    }
}
