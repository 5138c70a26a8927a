//! Inclusive time windows with optional bounds.

use std::fmt;

use chrono::{DateTime, Utc};

/// A `[start, end]` window over a timestamp column.
///
/// Both bounds are inclusive when present; `None` leaves that side open.
/// `start > end` is a legal (inverted) window that selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Window {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    /// Build a window from optional bounds.
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// The window that selects every row.
    pub const fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// `[start, end]`.
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// `[start, +inf)`.
    pub const fn starting_at(start: DateTime<Utc>) -> Self {
        Self::new(Some(start), None)
    }

    /// `(-inf, end]`.
    pub const fn ending_at(end: DateTime<Utc>) -> Self {
        Self::new(None, Some(end))
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True when both bounds are set and `start > end`.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| s <= ts) && self.end.is_none_or(|e| ts <= e)
    }
}

impl From<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> for Window {
    fn from((start, end): (Option<DateTime<Utc>>, Option<DateTime<Utc>>)) -> Self {
        Self::new(start, end)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(s) => write!(f, "[{}", s.to_rfc3339())?,
            None => f.write_str("(-inf")?,
        }
        f.write_str(", ")?;
        match self.end {
            Some(e) => write!(f, "{}]", e.to_rfc3339()),
            None => f.write_str("+inf)"),
        }
    }
}
