//! Error types and SNAFU context selectors for store construction and slicing.

use snafu::prelude::*;

use crate::time_column::TimeColumnError;

/// Errors from building or validating a [`crate::TableStore`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// No tables were supplied.
    #[snafu(display("Cannot build a table store from zero tables"))]
    EmptyInput,

    /// The same table name appeared more than once in the input.
    #[snafu(display("Table {name} was supplied more than once"))]
    DuplicateTable {
        /// The repeated table name.
        name: String,
    },

    /// A table failed timestamp column validation.
    #[snafu(display("Table {table} failed validation: {source}"))]
    InvalidTable {
        /// Name of the offending table.
        table: String,
        /// What was wrong with its timestamp column.
        source: TimeColumnError,
    },
}

/// Errors from a slice call. Any error aborts the whole batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SliceError {
    /// A table's timestamp column is missing, not a timestamp, or has nulls.
    #[snafu(display("Schema error in table {table}: {source}"))]
    Schema {
        /// Name of the offending table.
        table: String,
        /// Underlying timestamp column error.
        source: TimeColumnError,
    },

    /// The caller raised the batch's cancel flag.
    #[snafu(display("Slice over {total} tables was cancelled"))]
    Cancelled {
        /// Number of tables in the batch.
        total: usize,
    },

    /// A dedicated worker pool could not be started.
    #[snafu(display("Failed to build slice thread pool with {threads} threads: {source}"))]
    ThreadPool {
        /// Requested worker count after resolution.
        threads: usize,
        /// Underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },
}
