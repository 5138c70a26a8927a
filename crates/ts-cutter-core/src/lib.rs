//! Time-window slicing over named collections of Arrow tables.
//!
//! This crate provides the core pieces of `ts-cutter`:
//!
//! - A [`TableStore`] that owns a non-empty, name-keyed collection of
//!   immutable `RecordBatch`es, each ordered by a timestamp column
//!   (`store` module).
//! - A range slicer that binary-searches each table's timestamp column and
//!   returns zero-copy views restricted to an inclusive `[start, end]`
//!   [`Window`], sequentially or fanned out over a rayon pool (`slicer`
//!   module).
//! - Timestamp column resolution and exact bound conversion for every Arrow
//!   timestamp unit (`time_column` module).
//! - A seeded synthetic table generator used by tests and the `slice_bench`
//!   binary (`synth` module).
//!
//! ```rust,ignore
//! use ts_cutter_core::{TableStore, Window, slice};
//!
//! let store = TableStore::new(tables)?;
//! let sliced = slice(&store, Window::between(start, end), true)?;
//! ```
#![deny(missing_docs)]

pub mod cancel;
pub mod error;
pub mod options;
mod parallel;
pub mod slicer;
pub mod store;
pub mod synth;
pub mod time_column;
pub mod window;

pub use cancel::CancelFlag;
pub use error::{SliceError, StoreError};
pub use options::{DEFAULT_TIME_COLUMN, SliceOptions, StoreOptions};
pub use slicer::{SlicedTables, row_bounds, slice, slice_one, slice_with};
pub use store::TableStore;
pub use time_column::TimeColumnError;
pub use window::Window;
