//! Python bindings for ts-cutter.
//!
//! Exposes `RsCutter`, which owns a mapping of pyarrow tables and slices all
//! of them to a datetime window in one call.
mod error_map;
mod exceptions;

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;

/// Join the chunks of a pyarrow table into one batch.
///
/// A single-chunk table is returned as-is and keeps sharing its buffers with
/// Python. Multi-chunk tables are concatenated once, at construction.
fn combine_chunks(
    schema: &SchemaRef,
    mut batches: Vec<RecordBatch>,
) -> Result<RecordBatch, ArrowError> {
    if batches.len() == 1
        && let Some(batch) = batches.pop()
    {
        return Ok(batch);
    }
    concat_batches(schema, &batches)
}

#[pyo3::pymodule]
mod rs_cutter {
    use std::collections::{BTreeMap, HashMap};

    use arrow::array::{RecordBatch, RecordBatchReader};
    use arrow::ffi_stream::ArrowArrayStreamReader;
    use arrow::pyarrow::PyArrowType;
    use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
    use pyo3::{Bound, PyResult, prelude::*, pyclass, pymethods, types::PyModule};
    use ts_cutter_core::{StoreOptions, TableStore, Window, slice};

    use crate::error_map::{arrow_error_to_py, slice_error_to_py, store_error_to_py};
    use crate::exceptions::{CutterError, EmptyInputError, SchemaError};

    /// A Python datetime; naive values are taken as UTC.
    #[derive(FromPyObject)]
    enum PyTimestamp {
        Aware(DateTime<FixedOffset>),
        Naive(NaiveDateTime),
    }

    impl PyTimestamp {
        fn to_utc(&self) -> DateTime<Utc> {
            match self {
                Self::Aware(dt) => dt.with_timezone(&Utc),
                Self::Naive(dt) => dt.and_utc(),
            }
        }
    }

    fn read_table(name: &str, reader: ArrowArrayStreamReader) -> PyResult<RecordBatch> {
        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| arrow_error_to_py(name, e))?;
        crate::combine_chunks(&schema, batches).map_err(|e| arrow_error_to_py(name, e))
    }

    #[pyclass(frozen)]
    struct RsCutter {
        store: TableStore,
    }

    #[pymethods]
    impl RsCutter {
        #[new]
        #[pyo3(signature = (tables, time_column=None, validate=false))]
        fn new(
            py: Python<'_>,
            tables: HashMap<String, PyArrowType<ArrowArrayStreamReader>>,
            time_column: Option<String>,
            validate: bool,
        ) -> PyResult<Self> {
            let tables = tables
                .into_iter()
                .map(|(name, PyArrowType(reader))| {
                    let table = read_table(&name, reader)?;
                    Ok((name, table))
                })
                .collect::<PyResult<Vec<_>>>()?;

            let mut options = StoreOptions::default().with_validation(validate);
            if let Some(column) = time_column {
                options = options.with_time_column(column);
            }

            let store = TableStore::with_options(tables, options)
                .map_err(|e| store_error_to_py(py, e))?;
            Ok(Self { store })
        }

        fn total_row_count(&self) -> u64 {
            self.store.total_row_count()
        }

        fn table_names(&self) -> Vec<String> {
            self.store
                .table_names()
                .into_iter()
                .map(str::to_string)
                .collect()
        }

        fn __len__(&self) -> usize {
            self.store.len()
        }

        fn __repr__(&self) -> String {
            format!(
                "RsCutter(tables={}, rows={}, time_column={:?})",
                self.store.len(),
                self.store.total_row_count(),
                self.store.time_column()
            )
        }

        /// Slice every table to `[start, end]`; either bound may be None.
        #[pyo3(signature = (start=None, end=None, parallel=false))]
        fn slice(
            &self,
            py: Python<'_>,
            start: Option<PyTimestamp>,
            end: Option<PyTimestamp>,
            parallel: bool,
        ) -> PyResult<BTreeMap<String, PyArrowType<RecordBatch>>> {
            let window = Window::new(
                start.as_ref().map(PyTimestamp::to_utc),
                end.as_ref().map(PyTimestamp::to_utc),
            );

            let sliced = py
                .detach(|| slice(&self.store, window, parallel))
                .map_err(|e| slice_error_to_py(py, e))?;

            Ok(sliced
                .into_iter()
                .map(|(name, table)| (name, PyArrowType(table)))
                .collect())
        }
    }

    #[pymodule_init]
    fn init(m: &Bound<'_, PyModule>) -> PyResult<()> {
        let py = m.py();
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        m.add("CutterError", py.get_type::<CutterError>())?;
        m.add("EmptyInputError", py.get_type::<EmptyInputError>())?;
        m.add("SchemaError", py.get_type::<SchemaError>())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, Int64Array};
    use arrow::datatypes::{DataType, Field, Int64Type, Schema};

    use super::*;

    fn batch(schema: &SchemaRef, values: Vec<i64>) -> RecordBatch {
        RecordBatch::try_new(Arc::clone(schema), vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]))
    }

    #[test]
    fn single_chunk_keeps_its_buffers() {
        let schema = schema();
        let only = batch(&schema, vec![1, 2, 3]);
        let before = only.column(0).as_primitive::<Int64Type>().values().as_ptr();

        let out = combine_chunks(&schema, vec![only]).unwrap();

        let after = out.column(0).as_primitive::<Int64Type>().values().as_ptr();
        assert!(std::ptr::eq(before, after));
    }

    #[test]
    fn multiple_chunks_are_joined_in_order() {
        let schema = schema();
        let out = combine_chunks(
            &schema,
            vec![batch(&schema, vec![1, 2]), batch(&schema, vec![3])],
        )
        .unwrap();
        assert_eq!(&out.column(0).as_primitive::<Int64Type>().values()[..], &[1, 2, 3]);
    }

    #[test]
    fn no_chunks_give_an_empty_batch() {
        let schema = schema();
        let out = combine_chunks(&schema, Vec::new()).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema(), schema);
    }
}
