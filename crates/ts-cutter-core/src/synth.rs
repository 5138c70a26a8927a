//! Seeded synthetic tables for tests and benchmarks.
//!
//! Every generator takes the random source as an argument; nothing here
//! touches a global RNG, so a fixed seed always reproduces the same tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Int64Array, RecordBatch, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::options::DEFAULT_TIME_COLUMN;
use crate::time_column::{to_unit_ceil, to_unit_floor};

/// Shape of a generated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthSpec {
    /// Number of rows.
    pub rows: usize,
    /// Number of `Int64` payload columns (`Column 1`, `Column 2`, ...).
    pub columns: usize,
    /// Timestamp of the first row.
    pub start: DateTime<Utc>,
    /// Gap between consecutive distinct timestamps.
    pub step: TimeDelta,
    /// Arrow unit of the timestamp column.
    pub unit: TimeUnit,
    /// Each distinct timestamp is repeated between 1 and this many times.
    pub max_repeat: usize,
    /// Name of the timestamp column.
    pub time_column: String,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            rows: 100,
            columns: 5,
            // 2022-01-01T00:00:00Z
            start: DateTime::from_timestamp(1_640_995_200, 0).unwrap_or(DateTime::UNIX_EPOCH),
            step: TimeDelta::minutes(1),
            unit: TimeUnit::Nanosecond,
            max_repeat: 1,
            time_column: DEFAULT_TIME_COLUMN.to_string(),
        }
    }
}

impl SynthSpec {
    /// Set the row count.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Set the payload column count.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Set the first timestamp.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Set the gap between distinct timestamps.
    pub fn with_step(mut self, step: TimeDelta) -> Self {
        self.step = step;
        self
    }

    /// Set the timestamp unit.
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Allow up to `max_repeat` rows per distinct timestamp.
    pub fn with_max_repeat(mut self, max_repeat: usize) -> Self {
        self.max_repeat = max_repeat;
        self
    }
}

fn invalid(msg: impl Into<String>) -> ArrowError {
    ArrowError::InvalidArgumentError(msg.into())
}

fn timestamps<R: Rng>(rng: &mut R, spec: &SynthSpec) -> Result<Vec<i64>, ArrowError> {
    let start = i64::try_from(to_unit_ceil(spec.start, spec.unit))
        .map_err(|_| invalid(format!("start {} overflows {:?}", spec.start, spec.unit)))?;
    let step_end = spec
        .start
        .checked_add_signed(spec.step)
        .ok_or_else(|| invalid("start + step is out of range"))?;
    let step = i64::try_from(to_unit_floor(step_end, spec.unit) - i128::from(start))
        .map_err(|_| invalid("step overflows i64"))?;
    if step <= 0 {
        return Err(invalid(format!(
            "step {} is not positive in {:?}",
            spec.step, spec.unit
        )));
    }

    let max_repeat = spec.max_repeat.max(1);
    let mut out = Vec::with_capacity(spec.rows);
    let mut current = start;
    while out.len() < spec.rows {
        let repeat = rng.random_range(1..=max_repeat).min(spec.rows - out.len());
        out.extend(std::iter::repeat_n(current, repeat));
        current = current
            .checked_add(step)
            .ok_or_else(|| invalid("timestamp sequence overflows i64"))?;
    }
    Ok(out)
}

fn timestamp_array(unit: TimeUnit, values: Vec<i64>) -> ArrayRef {
    match unit {
        TimeUnit::Second => Arc::new(TimestampSecondArray::from(values)),
        TimeUnit::Millisecond => Arc::new(TimestampMillisecondArray::from(values)),
        TimeUnit::Microsecond => Arc::new(TimestampMicrosecondArray::from(values)),
        TimeUnit::Nanosecond => Arc::new(TimestampNanosecondArray::from(values)),
    }
}

/// Generate one table: a sorted timestamp column followed by random
/// `Int64` payload columns in `1..100`.
pub fn make_table<R: Rng>(
    rng: &mut R,
    spec: &SynthSpec,
) -> Result<RecordBatch, ArrowError> {
    let mut fields = Vec::with_capacity(spec.columns + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(spec.columns + 1);

    fields.push(Field::new(
        &spec.time_column,
        DataType::Timestamp(spec.unit, None),
        false,
    ));
    columns.push(timestamp_array(spec.unit, timestamps(rng, spec)?));

    for i in 0..spec.columns {
        fields.push(Field::new(format!("Column {}", i + 1), DataType::Int64, false));
        let values: Int64Array = (0..spec.rows)
            .map(|_| Some(rng.random_range(1..100_i64)))
            .collect();
        columns.push(Arc::new(values));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

/// Generate `count` tables named `Table 1`, `Table 2`, ... sharing `spec`.
pub fn make_tables<R: Rng>(
    rng: &mut R,
    count: usize,
    spec: &SynthSpec,
) -> Result<BTreeMap<String, RecordBatch>, ArrowError> {
    (0..count)
        .map(|i| make_table(rng, spec).map(|t| (format!("Table {}", i + 1), t)))
        .collect()
}
