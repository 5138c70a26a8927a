use arrow::error::ArrowError;
use pyo3::{PyErr, Python, types::PyAnyMethods};
use ts_cutter_core::{SliceError, StoreError};

use crate::exceptions::{CutterError, EmptyInputError, SchemaError};

fn schema_error_with_table(py: Python<'_>, msg: String, table: String) -> PyErr {
    let py_err = SchemaError::new_err(msg);
    let exc = py_err.value(py);

    if let Err(e) = exc.setattr("table", table) {
        return e;
    }

    py_err
}

pub(crate) fn store_error_to_py(py: Python<'_>, err: StoreError) -> PyErr {
    let msg = err.to_string();

    match err {
        StoreError::EmptyInput => EmptyInputError::new_err(msg),
        StoreError::InvalidTable { table, .. } => schema_error_with_table(py, msg, table),
        StoreError::DuplicateTable { .. } => CutterError::new_err(msg),
    }
}

pub(crate) fn slice_error_to_py(py: Python<'_>, err: SliceError) -> PyErr {
    let msg = err.to_string();

    match err {
        SliceError::Schema { table, .. } => schema_error_with_table(py, msg, table),
        SliceError::Cancelled { .. } | SliceError::ThreadPool { .. } => CutterError::new_err(msg),
    }
}

pub(crate) fn arrow_error_to_py(table: &str, err: ArrowError) -> PyErr {
    CutterError::new_err(format!("Failed to read table {table}: {err}"))
}
