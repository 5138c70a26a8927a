//! Owned, immutable collection of timestamp-ordered tables.
//!
//! A [`TableStore`] is built once from caller-supplied `RecordBatch`es and
//! then shared read-only across any number of slice calls. Tables are keyed
//! by name in a `BTreeMap`, so iteration (and therefore sequential slicing)
//! is always in name order.
//!
//! Construction only checks that at least one table is present and that
//! names are unique. Timestamp columns are trusted to be sorted; set
//! [`StoreOptions::validate`] or call [`TableStore::validate`] to check them
//! up front instead of at the first slice.

use std::collections::btree_map::{self, Entry};
use std::collections::{BTreeMap, BTreeSet};

use arrow::array::RecordBatch;
use log::debug;
use snafu::prelude::*;

use crate::{
    error::{DuplicateTableSnafu, EmptyInputSnafu, InvalidTableSnafu, StoreError},
    options::StoreOptions,
    time_column::TimeColumn,
};

/// Named collection of tables sharing one timestamp column name.
#[derive(Debug, Clone)]
pub struct TableStore {
    tables: BTreeMap<String, RecordBatch>,
    time_column: String,
}

impl TableStore {
    /// Build a store using the default `"TS"` timestamp column.
    ///
    /// Accepts any iterator of `(name, table)` pairs, e.g. a `HashMap`,
    /// `BTreeMap`, or `Vec`.
    pub fn new<I, K>(tables: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, RecordBatch)>,
        K: Into<String>,
    {
        Self::with_options(tables, StoreOptions::default())
    }

    /// Build a store with explicit [`StoreOptions`].
    pub fn with_options<I, K>(tables: I, options: StoreOptions) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, RecordBatch)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, table) in tables {
            match map.entry(name.into()) {
                Entry::Occupied(entry) => {
                    return DuplicateTableSnafu {
                        name: entry.key().as_str(),
                    }
                    .fail();
                }
                Entry::Vacant(entry) => {
                    entry.insert(table);
                }
            }
        }

        ensure!(!map.is_empty(), EmptyInputSnafu);

        let store = Self {
            tables: map,
            time_column: options.time_column,
        };

        if options.validate {
            store.validate()?;
        }

        debug!(
            "built table store: {} tables, {} rows, time column {}",
            store.len(),
            store.total_row_count(),
            store.time_column
        );

        Ok(store)
    }

    /// Check every table's timestamp column: present, a timestamp type,
    /// null-free, and sorted ascending.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (name, table) in &self.tables {
            TimeColumn::resolve(table, &self.time_column)
                .and_then(|ts| ts.ensure_sorted())
                .context(InvalidTableSnafu { table: name })?;
        }
        Ok(())
    }

    /// Sum of row counts across all tables.
    pub fn total_row_count(&self) -> u64 {
        self.tables.values().map(|t| t.num_rows() as u64).sum()
    }

    /// Row count of one table.
    pub fn row_count(&self, name: &str) -> Option<u64> {
        self.get(name).map(|t| t.num_rows() as u64)
    }

    /// Names of all tables.
    pub fn table_names(&self) -> BTreeSet<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&RecordBatch> {
        self.tables.get(name)
    }

    /// Name of the timestamp column slicing searches.
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Number of tables. Always at least one.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, RecordBatch> {
        self.tables.iter()
    }

    /// Give the tables back to the caller.
    pub fn into_tables(self) -> BTreeMap<String, RecordBatch> {
        self.tables
    }

    pub(crate) fn tables(&self) -> &BTreeMap<String, RecordBatch> {
        &self.tables
    }
}

impl<'a> IntoIterator for &'a TableStore {
    type Item = (&'a String, &'a RecordBatch);
    type IntoIter = btree_map::Iter<'a, String, RecordBatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use arrow::array::{Int64Array, TimestampSecondArray};
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

    use super::*;
    use crate::time_column::TimeColumnError;

    fn table(ts: Vec<i64>) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("TS", DataType::Timestamp(TimeUnit::Second, None), false),
            Field::new("v", DataType::Int64, false),
        ]);
        let values: Vec<i64> = (0..ts.len() as i64).collect();
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(TimestampSecondArray::from(ts)),
                Arc::new(Int64Array::from(values)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = TableStore::new(HashMap::<String, RecordBatch>::new()).unwrap_err();
        assert!(matches!(err, StoreError::EmptyInput));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = TableStore::new(vec![("a", table(vec![1])), ("a", table(vec![2]))]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTable { name } if name == "a"));
    }

    #[test]
    fn counts_rows_across_tables() {
        let store = TableStore::new(vec![
            ("a", table(vec![1, 2, 3])),
            ("b", table(vec![])),
            ("c", table(vec![5, 6])),
        ])
        .unwrap();

        assert_eq!(store.total_row_count(), 5);
        assert_eq!(store.row_count("b"), Some(0));
        assert_eq!(store.row_count("zzz"), None);
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.table_names().into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(store.get("c").map(|t| t.num_rows()), Some(2));
        assert_eq!(store.time_column(), "TS");
    }

    #[test]
    fn construction_does_not_check_order_by_default() {
        let store = TableStore::new(vec![("a", table(vec![3, 1]))]).unwrap();
        let err = store.validate().unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTable {
                source: TimeColumnError::Unsorted { row: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn eager_validation_rejects_missing_time_column() {
        let opts = StoreOptions::default()
            .with_time_column("ts")
            .with_validation(true);
        let err = TableStore::with_options(vec![("a", table(vec![1]))], opts).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTable {
                source: TimeColumnError::Missing { .. },
                ..
            }
        ));
    }

    #[test]
    fn eager_validation_accepts_sorted_duplicates() {
        let opts = StoreOptions::default().with_validation(true);
        let store = TableStore::with_options(vec![("a", table(vec![1, 1, 2, 2]))], opts).unwrap();
        assert_eq!(store.total_row_count(), 4);
    }
}
