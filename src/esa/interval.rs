//! lcp-intervals over suffix-array ranks.

use std::fmt;

/// Closed range `[lb, ub]` of suffix-array ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    /// First rank.
    pub lb: usize,
    /// Last rank (inclusive).
    pub ub: usize,
}

impl Interval {
    /// Interval covering ranks `lb..=ub`.
    pub fn new(lb: usize, ub: usize) -> Self {
        debug_assert!(lb <= ub, "interval bounds out of order: [{lb}, {ub}]");
        Self { lb, ub }
    }

    /// Number of suffixes in the interval.
    pub fn len(&self) -> usize {
        self.ub - self.lb + 1
    }

    /// Intervals are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the interval holds a single suffix (a leaf).
    pub fn is_singleton(&self) -> bool {
        self.lb == self.ub
    }

    /// Ranks covered by the interval.
    pub fn ranks(&self) -> std::ops::RangeInclusive<usize> {
        self.lb..=self.ub
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.lb, self.ub)
    }
}
