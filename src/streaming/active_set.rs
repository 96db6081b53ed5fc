//! Active set management for the overlap sweep.
//!
//! The ActiveSet holds the encompassing intervals of the current chromosome
//! that have started at or before the current position and may still contain
//! it. Only interval ends are stored, in a min-heap, so expiry always pops
//! the interval that ends first regardless of where it started.

use crate::streaming::buffers::DEFAULT_ACTIVE_CAPACITY;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Ends of the admitted intervals, smallest first.
///
/// The sweep admits an interval only once the current position has reached
/// its start, and positions never decrease within a chromosome. After
/// `expire_before(position)` every stored interval therefore contains
/// `position`, and the containment count is just `len()`.
#[derive(Debug)]
pub struct ActiveSet {
    ends: BinaryHeap<Reverse<u64>>,
    max_active: usize,
}

impl Default for ActiveSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ACTIVE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ends: BinaryHeap::with_capacity(capacity),
            max_active: 0,
        }
    }

    /// Admit an interval by its inclusive end.
    #[inline]
    pub fn push(&mut self, end: u64) {
        self.ends.push(Reverse(end));
        if self.ends.len() > self.max_active {
            self.max_active = self.ends.len();
        }
    }

    /// Number of admitted, unexpired intervals.
    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Remove intervals that end before `position`.
    ///
    /// Returns the number of intervals removed.
    #[inline]
    pub fn expire_before(&mut self, position: u64) -> usize {
        let mut removed = 0;
        while let Some(&Reverse(end)) = self.ends.peek() {
            if end >= position {
                break;
            }
            self.ends.pop();
            removed += 1;
        }
        removed
    }

    /// Smallest end still active.
    #[inline]
    pub fn min_end(&self) -> Option<u64> {
        self.ends.peek().map(|&Reverse(end)| end)
    }

    /// Clear all elements (chromosome change).
    pub fn clear(&mut self) {
        self.ends.clear();
    }

    /// Maximum active size observed.
    pub fn max_active(&self) -> usize {
        self.max_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_set_basic() {
        let mut set = ActiveSet::new();
        set.push(30);
        set.push(10);
        set.push(20);

        assert_eq!(set.len(), 3);
        assert_eq!(set.min_end(), Some(10));
        assert_eq!(set.max_active(), 3);
    }

    #[test]
    fn test_active_set_clear() {
        let mut set = ActiveSet::new();
        set.push(1);
        set.push(2);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.max_active(), 2);
    }

    #[test]
    fn test_expire_before_is_inclusive() {
        let mut set = ActiveSet::new();
        set.push(200);
        set.push(250);

        // An interval ending exactly at the position still contains it.
        assert_eq!(set.expire_before(200), 0);
        assert_eq!(set.expire_before(201), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_expire_behind_long_interval() {
        let mut set = ActiveSet::new();
        set.push(1000);
        set.push(130);
        set.push(500);

        assert_eq!(set.expire_before(200), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.min_end(), Some(500));
    }

    #[test]
    fn test_spanning_interval_does_not_retain_short_ones() {
        let mut set = ActiveSet::new();
        set.push(1_000_000_000);
        for start in 0..3999u64 {
            set.push(start * 10 + 5);
        }

        assert_eq!(set.expire_before(10_000_000), 3999);
        assert_eq!(set.len(), 1);
        assert_eq!(set.max_active(), 4000);
    }
}
