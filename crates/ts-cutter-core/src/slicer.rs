//! Range slicing over a [`TableStore`].
//!
//! For each table the slicer:
//! - resolves the timestamp column (missing, non-timestamp, or null-bearing
//!   columns are a [`SliceError::Schema`] for the whole batch),
//! - finds `start_index` as the lower bound of `window.start` and
//!   `end_index` as the upper bound of `window.end` by binary search,
//! - returns `table.slice(start_index, end_index - start_index)`, which
//!   shares the source buffers, or a zero-row slice with the same schema when
//!   the range is empty or inverted.
//!
//! Both bounds are inclusive, so every row equal to `start` or `end` is kept
//! even when many rows share that timestamp.
//!
//! Tables are independent. The sequential path walks them in name order; the
//! parallel path spawns one rayon task per table and assembles the same
//! name-keyed map, so output never depends on the execution mode. The first
//! error fails the call and no partial result is returned.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;

use arrow::array::RecordBatch;
use log::{debug, trace};
use rayon::prelude::*;
use snafu::prelude::*;

use crate::{
    cancel::CancelFlag,
    error::{CancelledSnafu, SchemaSnafu, SliceError, ThreadPoolSnafu},
    options::SliceOptions,
    parallel::resolve_slice_threads,
    store::TableStore,
    time_column::{TimeColumn, TimeColumnError},
    window::Window,
};

/// Result of a slice call: table name to windowed table.
pub type SlicedTables = BTreeMap<String, RecordBatch>;

fn bounds_in(ts: &TimeColumn<'_>, window: &Window) -> Range<usize> {
    let start = window.start.map_or(0, |s| ts.lower_bound(s));
    let end = window.end.map_or(ts.len(), |e| ts.upper_bound(e));
    if end <= start { start..start } else { start..end }
}

/// Row index range of `table` that falls inside `window`.
///
/// Empty (but positioned at the lower bound) when nothing matches.
pub fn row_bounds(
    table: &RecordBatch,
    time_column: &str,
    window: &Window,
) -> Result<Range<usize>, TimeColumnError> {
    let ts = TimeColumn::resolve(table, time_column)?;
    Ok(bounds_in(&ts, window))
}

/// Restrict one table to the rows whose timestamp lies in `window`.
///
/// An unbounded window returns the table itself (a cheap `Arc` clone).
pub fn slice_one(
    table: &RecordBatch,
    time_column: &str,
    window: &Window,
) -> Result<RecordBatch, TimeColumnError> {
    let ts = TimeColumn::resolve(table, time_column)?;
    if window.is_unbounded() {
        return Ok(table.clone());
    }

    let rows = bounds_in(&ts, window);
    trace!(
        "window {window} on {} rows -> rows {}..{}",
        ts.len(),
        rows.start,
        rows.end
    );
    Ok(table.slice(rows.start, rows.len()))
}

/// Slice every table in `store` to `window`.
///
/// `parallel` fans the per-table work out over the global rayon pool; the
/// result is identical either way.
pub fn slice(
    store: &TableStore,
    window: Window,
    parallel: bool,
) -> Result<SlicedTables, SliceError> {
    let options = SliceOptions {
        parallel,
        ..SliceOptions::default()
    };
    slice_with(store, window, &options)
}

/// Slice every table in `store` to `window` with explicit [`SliceOptions`].
pub fn slice_with(
    store: &TableStore,
    window: Window,
    options: &SliceOptions,
) -> Result<SlicedTables, SliceError> {
    let started = Instant::now();
    let cancel = options.cancel.as_ref();

    let out = match (options.parallel, options.threads) {
        (false, _) => slice_sequential(store, &window, cancel)?,
        (true, None) => slice_parallel(store, &window, cancel)?,
        (true, Some(requested)) => {
            let threads = resolve_slice_threads(store.len(), requested);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context(ThreadPoolSnafu { threads })?;
            pool.install(|| slice_parallel(store, &window, cancel))?
        }
    };

    debug!(
        "sliced {} tables to {window} ({}): {} of {} rows in {:?}",
        out.len(),
        if options.parallel { "parallel" } else { "sequential" },
        out.values().map(|t| t.num_rows() as u64).sum::<u64>(),
        store.total_row_count(),
        started.elapsed()
    );

    Ok(out)
}

fn slice_table(
    store: &TableStore,
    name: &str,
    table: &RecordBatch,
    window: &Window,
    cancel: Option<&CancelFlag>,
) -> Result<RecordBatch, SliceError> {
    if let Some(flag) = cancel
        && flag.is_cancelled()
    {
        return CancelledSnafu { total: store.len() }.fail();
    }
    slice_one(table, store.time_column(), window).context(SchemaSnafu { table: name })
}

fn slice_sequential(
    store: &TableStore,
    window: &Window,
    cancel: Option<&CancelFlag>,
) -> Result<SlicedTables, SliceError> {
    store
        .iter()
        .map(|(name, table)| {
            slice_table(store, name, table, window, cancel).map(|sliced| (name.clone(), sliced))
        })
        .collect()
}

fn slice_parallel(
    store: &TableStore,
    window: &Window,
    cancel: Option<&CancelFlag>,
) -> Result<SlicedTables, SliceError> {
    store
        .tables()
        .par_iter()
        .map(|(name, table)| {
            slice_table(store, name, table, window, cancel).map(|sliced| (name.clone(), sliced))
        })
        .collect()
}
