//! Python exception types exposed by the `rs_cutter` module.

use pyo3::{create_exception, exceptions::PyException};

create_exception!(
    rs_cutter,
    CutterError,
    PyException,
    "Base exception for rs_cutter."
);

create_exception!(
    rs_cutter,
    EmptyInputError,
    CutterError,
    "Raised when a cutter is built from an empty table mapping."
);

create_exception!(
    rs_cutter,
    SchemaError,
    CutterError,
    "Raised when a table's timestamp column is missing, mistyped, null-bearing, or unsorted."
);
