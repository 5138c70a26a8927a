//! Locating and reading the timestamp column of a table.
//!
//! Every table in a store carries one designated timestamp column. Slicing
//! needs it as a plain `&[i64]` in the column's own unit, plus a way to turn
//! a `DateTime<Utc>` window bound into that unit without losing precision.
//!
//! Bound conversion rounds the start bound up and the end bound down, so a
//! bound finer than the column unit never admits a row outside the window.
//! Comparisons run in `i128` space: a bound that does not fit the column's
//! `i64` range (for example year 3000 in nanoseconds) lands before or after
//! every row instead of overflowing.

use arrow::array::{Array, AsArray, RecordBatch};
use arrow::datatypes::{
    ArrowTimestampType, DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use chrono::{DateTime, Utc};
use snafu::Snafu;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Errors that can occur when locating or validating a timestamp column.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum TimeColumnError {
    /// The configured time column was not found in the table schema.
    #[snafu(display("Time column {column} not found in schema"))]
    Missing {
        /// The name of the time column that was expected but not found.
        column: String,
    },

    /// The time column exists but is not an Arrow timestamp column.
    #[snafu(display("Unsupported arrow type for time column {column}: {datatype}"))]
    UnsupportedArrowType {
        /// The name of the time column.
        column: String,
        /// The Arrow data type found for the column.
        datatype: DataType,
    },

    /// The time column contains nulls, which have no position in the
    /// ascending order slicing relies on.
    #[snafu(display("Time column {column} contains {null_count} null values"))]
    NullValues {
        /// The name of the time column.
        column: String,
        /// Number of null slots in the column.
        null_count: usize,
    },

    /// The time column is not sorted ascending.
    ///
    /// Only reported by explicit validation; slicing itself assumes order.
    #[snafu(display("Time column {column} is not sorted ascending at row {row}"))]
    Unsorted {
        /// The name of the time column.
        column: String,
        /// First row whose value is smaller than its predecessor.
        row: usize,
    },
}

/// A resolved, borrowed view of a table's timestamp column.
#[derive(Debug, Clone, Copy)]
pub struct TimeColumn<'a> {
    name: &'a str,
    unit: TimeUnit,
    values: &'a [i64],
}

impl<'a> TimeColumn<'a> {
    /// Locate `column` in `table` and check that it is a non-null timestamp
    /// column of any unit.
    pub fn resolve(table: &'a RecordBatch, column: &'a str) -> Result<Self, TimeColumnError> {
        let idx = table
            .schema_ref()
            .index_of(column)
            .map_err(|_| TimeColumnError::Missing {
                column: column.to_string(),
            })?;
        let array = table.column(idx);

        let values = match array.data_type() {
            DataType::Timestamp(TimeUnit::Second, _) => {
                timestamp_values::<TimestampSecondType>(array.as_ref())
            }
            DataType::Timestamp(TimeUnit::Millisecond, _) => {
                timestamp_values::<TimestampMillisecondType>(array.as_ref())
            }
            DataType::Timestamp(TimeUnit::Microsecond, _) => {
                timestamp_values::<TimestampMicrosecondType>(array.as_ref())
            }
            DataType::Timestamp(TimeUnit::Nanosecond, _) => {
                timestamp_values::<TimestampNanosecondType>(array.as_ref())
            }
            _ => None,
        };
        let (unit, values) = values.ok_or_else(|| TimeColumnError::UnsupportedArrowType {
            column: column.to_string(),
            datatype: array.data_type().clone(),
        })?;

        let null_count = array.null_count();
        if null_count > 0 {
            return NullValuesSnafu { column, null_count }.fail();
        }

        Ok(Self {
            name: column,
            unit,
            values,
        })
    }

    /// Column name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Arrow time unit of the stored values.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Raw epoch offsets in [`Self::unit`].
    pub fn values(&self) -> &'a [i64] {
        self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First index whose timestamp is `>= start`.
    pub fn lower_bound(&self, start: DateTime<Utc>) -> usize {
        let bound = to_unit_ceil(start, self.unit);
        self.values.partition_point(|&v| i128::from(v) < bound)
    }

    /// First index whose timestamp is `> end`.
    pub fn upper_bound(&self, end: DateTime<Utc>) -> usize {
        let bound = to_unit_floor(end, self.unit);
        self.values.partition_point(|&v| i128::from(v) <= bound)
    }

    /// Fail with [`TimeColumnError::Unsorted`] if any value is smaller than
    /// its predecessor.
    pub fn ensure_sorted(&self) -> Result<(), TimeColumnError> {
        match self.values.windows(2).position(|w| w[0] > w[1]) {
            Some(pos) => UnsortedSnafu {
                column: self.name,
                row: pos + 1,
            }
            .fail(),
            None => Ok(()),
        }
    }
}

fn timestamp_values<T: ArrowTimestampType>(array: &dyn Array) -> Option<(TimeUnit, &[i64])> {
    array
        .as_primitive_opt::<T>()
        .map(|arr| (T::UNIT, &arr.values()[..]))
}

fn nanos_per_unit(unit: TimeUnit) -> i128 {
    match unit {
        TimeUnit::Second => NANOS_PER_SECOND,
        TimeUnit::Millisecond => 1_000_000,
        TimeUnit::Microsecond => 1_000,
        TimeUnit::Nanosecond => 1,
    }
}

fn epoch_nanos(ts: DateTime<Utc>) -> i128 {
    i128::from(ts.timestamp()) * NANOS_PER_SECOND + i128::from(ts.timestamp_subsec_nanos())
}

/// Largest value in `unit` that is `<= ts`.
pub(crate) fn to_unit_floor(ts: DateTime<Utc>, unit: TimeUnit) -> i128 {
    epoch_nanos(ts).div_euclid(nanos_per_unit(unit))
}

/// Smallest value in `unit` that is `>= ts`.
pub(crate) fn to_unit_ceil(ts: DateTime<Utc>, unit: TimeUnit) -> i128 {
    -(-epoch_nanos(ts)).div_euclid(nanos_per_unit(unit))
}
