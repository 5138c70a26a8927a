//! Store and slice configuration.

use crate::cancel::CancelFlag;

/// Timestamp column name used when none is configured.
pub const DEFAULT_TIME_COLUMN: &str = "TS";

/// Options applied when building a [`crate::TableStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Name of the timestamp column every table is ordered by.
    pub time_column: String,
    /// Check every table's timestamp column (presence, type, nulls,
    /// ascending order) at construction. Costs one pass over each column.
    pub validate: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            validate: false,
        }
    }
}

impl StoreOptions {
    /// Use `column` as the timestamp column.
    pub fn with_time_column(mut self, column: impl Into<String>) -> Self {
        self.time_column = column.into();
        self
    }

    /// Enable or disable eager validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Execution options for a slice call.
#[derive(Debug, Clone, Default)]
pub struct SliceOptions {
    /// Fan out one task per table instead of slicing in name order.
    pub parallel: bool,
    /// Run parallel work on a dedicated pool of this many threads instead of
    /// the global rayon pool. Ignored when `parallel` is false.
    pub threads: Option<usize>,
    /// Checked before each per-table task.
    pub cancel: Option<CancelFlag>,
}

impl SliceOptions {
    /// Slice tables one at a time.
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Slice tables on the global rayon pool.
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    /// Use a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Attach a cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
