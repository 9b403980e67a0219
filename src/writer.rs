//! Direct writes: persist a record with exactly one INSERT or UPDATE.
//!
//! Nothing else runs. No hooks, no validation, and the record's change set
//! is left as it was. On insert the record's primary key and new flag are
//! updated; on update the record is not touched at all.

use crate::error::{Error, Result};
use crate::model::{ColumnValues, Record, Value};
use crate::storage::{Backend, InsertSource};
use tracing::{debug, warn};

/// Issues direct writes against a backend.
#[derive(Debug)]
pub struct DirectWriter<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> DirectWriter<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Save the record, reporting a rejected statement as `Ok(false)`.
    ///
    /// Returns `true` if a row was inserted, an update matched a row, or
    /// there was nothing to update.
    ///
    /// # Errors
    ///
    /// Propagates every error except `StatementFailed`.
    pub fn write_best_effort<R: Record + ?Sized>(&self, record: &mut R) -> Result<bool> {
        match self.create_or_update(record) {
            Err(Error::StatementFailed { table, message }) => {
                warn!(table = %table, error = %message, "direct write rejected");
                Ok(false)
            }
            other => other,
        }
    }

    /// Save the record, propagating every failure.
    ///
    /// # Errors
    ///
    /// Returns `StatementFailed` if the backend rejects the statement, or
    /// any other error raised along the way.
    pub fn write_or_fail<R: Record + ?Sized>(&self, record: &mut R) -> Result<bool> {
        self.create_or_update(record)
    }

    /// Column names used to build inserts.
    #[must_use]
    pub fn column_names<R: Record + ?Sized>(&self, record: &R) -> Vec<String> {
        record.column_names()
    }

    /// Values persisted for the record.
    #[must_use]
    pub fn column_values<R: Record + ?Sized>(&self, record: &R) -> ColumnValues {
        record.column_values()
    }

    fn create_or_update<R: Record + ?Sized>(&self, record: &mut R) -> Result<bool> {
        if record.is_new() {
            self.create(record)
        } else {
            self.update(record)
        }
    }

    fn create<R: Record + ?Sized>(&self, record: &mut R) -> Result<bool> {
        let table = record.table();
        let primary_key = record.primary_key_column().to_string();
        let prefetch = self.backend.prefetch_primary_key(&table.name);

        if prefetch && record.primary_key_value().is_null() {
            let id = self.backend.next_sequence_value(&table.sequence_name())?;
            record.set_primary_key_value(id);
        }

        let mut values = self.insert_values(record);

        // Some dialects reject an explicit NULL key.
        if !prefetch && record.primary_key_value().is_null() {
            values.remove(&primary_key);
        }

        debug!(table = %table.name, columns = values.len(), "direct insert");
        let new_id = if values.is_empty() {
            let fragment = self.backend.empty_insert_statement_value();
            self.backend
                .execute_insert(&table.name, &primary_key, InsertSource::Fragment(fragment))?
        } else {
            self.backend
                .execute_insert(&table.name, &primary_key, InsertSource::Values(&values))?
        };

        record.set_new(false);
        if record.primary_key_value().is_null() {
            record.set_primary_key_value(new_id.unwrap_or_default());
        }

        // Zero is a valid key.
        Ok(!record.primary_key_value().is_null())
    }

    fn update<R: Record + ?Sized>(&self, record: &mut R) -> Result<bool> {
        let changes = record.changes();
        if changes.is_empty() {
            return Ok(true);
        }

        let table = record.table();
        let primary_key = record.primary_key_column().to_string();
        let original_key = match changes.get(&primary_key) {
            Some(change) => change.old.clone(),
            None => record.primary_key_value(),
        };

        let values = record.column_values();
        if values.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "record for {} has no columns to update",
                table.name
            )));
        }

        debug!(table = %table.name, key = %original_key, columns = values.len(), "direct update");
        let affected =
            self.backend
                .execute_update_where(&table.name, &primary_key, &original_key, &values)?;
        Ok(affected > 0)
    }

    /// Values for the columns named by `column_names`, in that order.
    fn insert_values<R: Record + ?Sized>(&self, record: &R) -> ColumnValues {
        let values = record.column_values();
        record
            .column_names()
            .into_iter()
            .filter_map(|name| {
                let value: Value = values.get(&name)?.clone();
                Some((name, value))
            })
            .collect()
    }
}

/// Direct writes as methods on any record.
///
/// ```no_run
/// use sneaky::model::{DynamicRecord, TableRef};
/// use sneaky::storage::SqliteBackend;
/// use sneaky::DirectWrite;
///
/// let backend = SqliteBackend::open_memory()?;
/// let mut user = DynamicRecord::new(TableRef::new("users"), "id");
/// user.set("name", "ada");
/// let saved = user.write_direct(&backend)?;
/// # Ok::<(), sneaky::Error>(())
/// ```
pub trait DirectWrite: Record {
    /// See [`DirectWriter::write_best_effort`].
    ///
    /// # Errors
    ///
    /// Propagates every error except `StatementFailed`.
    fn write_direct<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<bool> {
        DirectWriter::new(backend).write_best_effort(self)
    }

    /// See [`DirectWriter::write_or_fail`].
    ///
    /// # Errors
    ///
    /// Propagates every error.
    fn write_direct_or_fail<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<bool> {
        DirectWriter::new(backend).write_or_fail(self)
    }
}

impl<R: Record + ?Sized> DirectWrite for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Changes, DynamicRecord, TableRef};
    use crate::storage::{SequencedBackend, SqliteBackend};
    use std::cell::{Cell, RefCell};

    const SCHEMA: &str = "
        CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE
        );
        CREATE TABLE counters (
            id INTEGER PRIMARY KEY,
            hits INTEGER NOT NULL DEFAULT 0
        );";

    /// Counts statements and records the last insert's columns.
    struct Recording<B> {
        inner: B,
        statements: Cell<usize>,
        sequence_calls: Cell<usize>,
        last_insert: RefCell<Option<Vec<String>>>,
        last_update_key: RefCell<Option<Value>>,
    }

    impl<B: Backend> Recording<B> {
        fn new(inner: B) -> Self {
            Self {
                inner,
                statements: Cell::new(0),
                sequence_calls: Cell::new(0),
                last_insert: RefCell::new(None),
                last_update_key: RefCell::new(None),
            }
        }
    }

    impl<B: Backend> Backend for Recording<B> {
        fn prefetch_primary_key(&self, table: &str) -> bool {
            self.inner.prefetch_primary_key(table)
        }

        fn next_sequence_value(&self, sequence: &str) -> Result<Value> {
            self.sequence_calls.set(self.sequence_calls.get() + 1);
            self.inner.next_sequence_value(sequence)
        }

        fn execute_insert(
            &self,
            table: &str,
            primary_key: &str,
            source: InsertSource<'_>,
        ) -> Result<Option<Value>> {
            self.statements.set(self.statements.get() + 1);
            let columns = match source {
                InsertSource::Values(values) => values.names().map(str::to_string).collect(),
                InsertSource::Fragment(_) => Vec::new(),
            };
            *self.last_insert.borrow_mut() = Some(columns);
            self.inner.execute_insert(table, primary_key, source)
        }

        fn execute_update_where(
            &self,
            table: &str,
            primary_key: &str,
            key_value: &Value,
            values: &ColumnValues,
        ) -> Result<usize> {
            self.statements.set(self.statements.get() + 1);
            *self.last_update_key.borrow_mut() = Some(key_value.clone());
            self.inner
                .execute_update_where(table, primary_key, key_value, values)
        }
    }

    fn sqlite() -> Recording<SqliteBackend> {
        let backend = SqliteBackend::open_memory().unwrap();
        backend.connection().execute_batch(SCHEMA).unwrap();
        Recording::new(backend)
    }

    fn sequenced() -> Recording<SequencedBackend> {
        let backend = SequencedBackend::open_memory().unwrap();
        backend.connection().execute_batch(SCHEMA).unwrap();
        Recording::new(backend)
    }

    fn new_user(name: &str, email: &str) -> DynamicRecord {
        let mut user = DynamicRecord::new(TableRef::new("users"), "id");
        user.set("id", Value::Null);
        user.set("name", name);
        user.set("email", email);
        user
    }

    fn row(backend: &SqliteBackend, id: i64) -> Option<ColumnValues> {
        backend.find("users", "id", &Value::Integer(id)).unwrap()
    }

    #[test]
    fn test_insert_persists_attributes_and_assigns_key() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");

        let saved = DirectWriter::new(&backend).write_or_fail(&mut user).unwrap();

        assert!(saved);
        assert!(!user.is_new());
        assert_eq!(user.primary_key_value(), Value::Integer(1));

        let stored = row(&backend.inner, 1).unwrap();
        assert_eq!(stored, user.attributes());
    }

    #[test]
    fn test_auto_key_backend_omits_absent_key() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");

        user.write_direct(&backend).unwrap();

        let columns = backend.last_insert.borrow().clone().unwrap();
        assert_eq!(columns, vec!["name".to_string(), "email".to_string()]);
        assert_eq!(backend.sequence_calls.get(), 0);
    }

    #[test]
    fn test_explicit_key_is_kept() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");
        user.set("id", 42);

        assert!(user.write_direct_or_fail(&backend).unwrap());
        assert_eq!(user.primary_key_value(), Value::Integer(42));
        assert!(row(&backend.inner, 42).is_some());
    }

    #[test]
    fn test_sequenced_backend_prefetches_key_once() {
        let backend = sequenced();
        backend.inner.next_sequence_value("users_seq").unwrap();

        let mut user = new_user("ada", "ada@example.com");
        assert!(user.write_direct_or_fail(&backend).unwrap());

        assert_eq!(backend.sequence_calls.get(), 1);
        assert_eq!(user.primary_key_value(), Value::Integer(2));
        let columns = backend.last_insert.borrow().clone().unwrap();
        assert_eq!(columns[0], "id");
        assert!(row(backend.inner.sqlite(), 2).is_some());
    }

    #[test]
    fn test_sequenced_backend_uses_custom_sequence_name() {
        let backend = sequenced();
        let mut user = DynamicRecord::new(TableRef::new("users").with_sequence("people"), "id");
        user.set("name", "ada");

        user.write_direct_or_fail(&backend).unwrap();
        assert_eq!(backend.inner.next_sequence_value("people").unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_sequenced_backend_skips_prefetch_when_key_present() {
        let backend = sequenced();
        let mut user = new_user("ada", "ada@example.com");
        user.set("id", 10);

        user.write_direct_or_fail(&backend).unwrap();
        assert_eq!(backend.sequence_calls.get(), 0);
    }

    #[test]
    fn test_empty_insert_uses_default_values() {
        let backend = sqlite();
        let mut counter = DynamicRecord::new(TableRef::new("counters"), "id");

        assert!(counter.write_direct_or_fail(&backend).unwrap());
        assert_eq!(counter.primary_key_value(), Value::Integer(1));
        assert_eq!(backend.last_insert.borrow().clone().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_zero_key_counts_as_saved() {
        let backend = sqlite();
        let mut user = new_user("zero", "zero@example.com");
        user.set("id", 0);

        assert!(user.write_direct_or_fail(&backend).unwrap());
    }

    #[test]
    fn test_unchanged_record_issues_no_statement() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");
        user.write_direct_or_fail(&backend).unwrap();
        user.clear_changes();
        let before = backend.statements.get();

        assert!(user.write_direct(&backend).unwrap());
        assert!(user.write_direct(&backend).unwrap());
        assert_eq!(backend.statements.get(), before);
    }

    #[test]
    fn test_update_writes_full_attribute_map() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");
        user.write_direct_or_fail(&backend).unwrap();

        let stored = row(&backend.inner, 1).unwrap();
        let mut loaded = DynamicRecord::loaded(TableRef::new("users"), "id", stored);
        loaded.set("name", "grace");

        assert!(loaded.write_direct_or_fail(&backend).unwrap());
        let stored = row(&backend.inner, 1).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::from("grace")));
        assert_eq!(stored.get("email"), Some(&Value::from("ada@example.com")));
        // The writer leaves dirty tracking alone.
        assert_eq!(loaded.changes().len(), 1);
    }

    #[test]
    fn test_update_of_missing_row_returns_false() {
        let backend = sqlite();
        let attrs: ColumnValues = [("id", Value::from(5)), ("name", Value::from("ghost"))]
            .into_iter()
            .collect();
        let mut user = DynamicRecord::loaded(TableRef::new("users"), "id", attrs);
        user.set("name", "still a ghost");

        assert!(!user.write_direct(&backend).unwrap());
    }

    #[test]
    fn test_key_reassignment_targets_old_key() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com");
        user.write_direct_or_fail(&backend).unwrap();

        let stored = row(&backend.inner, 1).unwrap();
        let mut loaded = DynamicRecord::loaded(TableRef::new("users"), "id", stored);
        loaded.set("id", 77);

        assert!(loaded.write_direct_or_fail(&backend).unwrap());
        assert_eq!(*backend.last_update_key.borrow(), Some(Value::Integer(1)));
        assert!(row(&backend.inner, 1).is_none());
        assert_eq!(
            row(&backend.inner, 77).unwrap().get("name"),
            Some(&Value::from("ada"))
        );
    }

    #[test]
    fn test_unique_violation_best_effort_vs_strict() {
        let backend = sqlite();
        new_user("ada", "dup@example.com")
            .write_direct_or_fail(&backend)
            .unwrap();

        let mut dup = new_user("imposter", "dup@example.com");
        assert!(!dup.write_direct(&backend).unwrap());

        let mut dup = new_user("imposter", "dup@example.com");
        let err = dup.write_direct_or_fail(&backend).unwrap_err();
        assert!(err.is_statement_failure());
    }

    #[test]
    fn test_missing_table_propagates_from_best_effort() {
        let backend = sqlite();
        let mut ghost = DynamicRecord::new(TableRef::new("ghosts"), "id");
        ghost.set("name", "boo");

        let err = ghost.write_direct(&backend).unwrap_err();
        assert!(matches!(err, Error::MissingTable { .. }));
    }

    #[test]
    fn test_unknown_key_column_leaves_other_rows_alone() {
        let backend = sqlite();
        for name in ["a", "b", "c"] {
            new_user(name, &format!("{name}@example.com"))
                .write_direct_or_fail(&backend)
                .unwrap();
        }

        let attrs: ColumnValues = [("uid", Value::from("uid")), ("name", Value::from("a"))]
            .into_iter()
            .collect();
        let mut stray = DynamicRecord::loaded(TableRef::new("users"), "uid", attrs)
            .with_column_names(["name"]);
        stray.set("name", "zzz");

        let err = stray.write_direct_or_fail(&backend).unwrap_err();
        assert!(err.is_statement_failure(), "got {err:?}");
        assert!(!stray.write_direct(&backend).unwrap());

        for id in 1..=3 {
            let stored = row(&backend.inner, id).unwrap();
            assert_ne!(stored.get("name"), Some(&Value::from("zzz")));
        }
    }

    #[test]
    fn test_unknown_key_column_fails_insert() {
        let backend = sqlite();
        let mut stray = DynamicRecord::new(TableRef::new("users"), "uid");
        stray.set("name", "ada");

        let err = stray.write_direct_or_fail(&backend).unwrap_err();
        assert!(err.is_statement_failure(), "got {err:?}");
        assert!(stray.is_new());
        assert!(row(&backend.inner, 1).is_none());
    }

    #[test]
    fn test_column_override_limits_insert() {
        let backend = sqlite();
        let mut user = new_user("ada", "ada@example.com").with_column_names(["name"]);

        let writer = DirectWriter::new(&backend);
        assert_eq!(writer.column_names(&user), vec!["name".to_string()]);
        writer.write_or_fail(&mut user).unwrap();

        let stored = row(&backend.inner, 1).unwrap();
        assert_eq!(stored.get("email"), Some(&Value::Null));
    }

    /// A hand-written record type relying on the trait defaults.
    struct Tag {
        id: Option<i64>,
        label: String,
        persisted: bool,
    }

    impl Record for Tag {
        fn table(&self) -> TableRef {
            TableRef::new("tags")
        }

        fn primary_key_column(&self) -> &str {
            "id"
        }

        fn is_new(&self) -> bool {
            !self.persisted
        }

        fn set_new(&mut self, new: bool) {
            self.persisted = !new;
        }

        fn attributes(&self) -> ColumnValues {
            [("id", Value::from(self.id)), ("label", Value::from(self.label.as_str()))]
                .into_iter()
                .collect()
        }

        fn changes(&self) -> Changes {
            Changes::new()
        }

        fn set_primary_key_value(&mut self, value: Value) {
            if let Value::Integer(id) = value {
                self.id = Some(id);
            }
        }
    }

    #[test]
    fn test_custom_record_type() {
        let backend = SqliteBackend::open_memory().unwrap();
        backend
            .connection()
            .execute_batch("CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT)")
            .unwrap();

        let mut tag = Tag {
            id: None,
            label: "rust".to_string(),
            persisted: false,
        };
        let writer = DirectWriter::new(&backend);
        assert!(writer.write_or_fail(&mut tag).unwrap());
        assert_eq!(tag.id, Some(1));
        assert!(!tag.is_new());
        assert_eq!(writer.column_values(&tag).get("label"), Some(&Value::from("rust")));
    }
}
