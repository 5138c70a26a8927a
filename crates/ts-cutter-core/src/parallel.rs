//! Thread-count resolution for parallel slicing.

use log::warn;

/// Resolve the size of a dedicated slice pool.
///
/// Never spawns more workers than there are tables, and caps the request at
/// twice the logical core count. A request of zero falls back to the logical
/// core count.
pub(crate) fn resolve_slice_threads(num_tables: usize, requested: usize) -> usize {
    let logical_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    clamp_slice_threads(num_tables, requested, logical_threads)
}

fn clamp_slice_threads(num_tables: usize, requested: usize, logical_threads: usize) -> usize {
    let logical_threads = logical_threads.max(1);
    let max_threads = logical_threads.saturating_mul(2);

    let wanted = if requested == 0 {
        warn!("requested 0 slice threads; using {logical_threads}");
        logical_threads
    } else {
        requested.min(max_threads)
    };

    wanted.min(num_tables).max(1)
}
