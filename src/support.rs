use nalgebra::RealField;

use crate::error::{Result, SplineError};
use crate::grid::Grid;

/// A contiguous index range `[start, end)` into a [Grid], denoting the
/// domain of a piecewise function. Because supports address the shared grid
/// by index, two supports on the same grid can be compared, intersected and
/// merged without recomputing floating point boundaries.
///
/// An empty support is canonical: its start and end index are both zero.
#[derive(Debug, Clone)]
pub struct Support<T> {
    grid: Grid<T>,
    start: usize,
    end: usize,
}

impl<T: RealField + Copy> Support<T> {
    /// Creates a support over `grid` covering the grid points with indices
    /// `start..end`.
    ///
    /// # Errors
    /// Returns [SplineError::IndexOutOfRange] if the range is decreasing or
    /// reaches beyond the grid, and [SplineError::InconsistentData] for an
    /// empty range that is not the canonical `[0, 0)`.
    pub fn new(grid: Grid<T>, start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(SplineError::IndexOutOfRange {
                index: start,
                len: end,
            });
        }
        if end > grid.len() {
            return Err(SplineError::IndexOutOfRange {
                index: end,
                len: grid.len(),
            });
        }
        if start == end && start != 0 {
            return Err(SplineError::InconsistentData(
                "an empty support must use start and end indices 0".to_string(),
            ));
        }
        Ok(Support { grid, start, end })
    }

    /// Creates a support covering the whole grid.
    pub fn whole_grid(grid: Grid<T>) -> Self {
        let end = grid.len();
        Support {
            grid,
            start: 0,
            end,
        }
    }

    /// Creates the canonical empty support on `grid`.
    pub fn empty(grid: Grid<T>) -> Self {
        Support {
            grid,
            start: 0,
            end: 0,
        }
    }

    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn end_index(&self) -> usize {
        self.end
    }

    /// Number of grid points contained in the support.
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of intervals represented by this support.
    pub fn interval_count(&self) -> usize {
        self.size().saturating_sub(1)
    }

    /// Whether the support contains at least one interval. A point-like
    /// support holds a grid point but no interval.
    pub fn has_intervals(&self) -> bool {
        self.size() > 1
    }

    /// The grid points contained in the support.
    pub fn points(&self) -> &[T] {
        &self.grid.values()[self.start..self.end]
    }

    /// Returns the `index`th grid point of the support, checking bounds.
    ///
    /// # Errors
    /// Returns [SplineError::IndexOutOfRange] on an access beyond the
    /// support.
    pub fn at(&self, index: usize) -> Result<T> {
        self.points()
            .get(index)
            .copied()
            .ok_or(SplineError::IndexOutOfRange {
                index,
                len: self.size(),
            })
    }

    pub fn front(&self) -> Option<T> {
        self.points().first().copied()
    }

    pub fn back(&self) -> Option<T> {
        self.points().last().copied()
    }

    /// Whether the grids the two supports are defined on are logically
    /// equivalent.
    pub fn has_same_grid(&self, other: &Support<T>) -> bool {
        self.grid == other.grid
    }

    /// Translates an index relative to this support into an index on the
    /// grid.
    pub fn absolute_from_relative(&self, index: usize) -> usize {
        debug_assert!(index < self.size());
        self.start + index
    }

    /// Translates a grid index into an index relative to this support, or
    /// [None] if the grid point is not part of the support.
    pub fn relative_from_absolute(&self, index: usize) -> Option<usize> {
        if index >= self.start && index < self.end {
            Some(index - self.start)
        } else {
            None
        }
    }

    /// Translates a grid interval index into an interval index relative to
    /// this support, or [None] if the interval is not part of the support.
    pub fn interval_from_absolute(&self, index: usize) -> Option<usize> {
        if index >= self.start && index + 1 < self.end {
            Some(index - self.start)
        } else {
            None
        }
    }

    /// Calculates the union of the two supports. This is a convex hull
    /// rather than a set union: if the supports do not overlap, the result
    /// also contains the gap between them.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the supports are defined on
    /// differing grids.
    pub fn union(&self, other: &Support<T>) -> Result<Support<T>> {
        if !self.has_same_grid(other) {
            return Err(SplineError::DifferingGrids);
        }
        Ok(self.union_unchecked(other))
    }

    /// Calculates the intersection of the two supports. A result without
    /// intervals means the supports share no domain.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the supports are defined on
    /// differing grids.
    pub fn intersection(&self, other: &Support<T>) -> Result<Support<T>> {
        if !self.has_same_grid(other) {
            return Err(SplineError::DifferingGrids);
        }
        Ok(self.intersection_unchecked(other))
    }

    /// Constructor for ranges that are valid by construction.
    pub(crate) fn from_range_unchecked(grid: Grid<T>, start: usize, end: usize) -> Support<T> {
        debug_assert!(start <= end && end <= grid.len());
        debug_assert!(start != end || start == 0);
        Support { grid, start, end }
    }

    pub(crate) fn union_unchecked(&self, other: &Support<T>) -> Support<T> {
        debug_assert!(self.has_same_grid(other));
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Support {
            grid: self.grid.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub(crate) fn intersection_unchecked(&self, other: &Support<T>) -> Support<T> {
        debug_assert!(self.has_same_grid(other));
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start >= end {
            Support::empty(self.grid.clone())
        } else {
            Support {
                grid: self.grid.clone(),
                start,
                end,
            }
        }
    }
}

impl<T: RealField + Copy> PartialEq for Support<T> {
    /// Two supports are equal if they are defined on the same logical grid
    /// and cover the same index range. Empty supports are all equal,
    /// regardless of their grid, so that zero splines from different
    /// generators compare equal.
    fn eq(&self, other: &Self) -> bool {
        (self.is_empty() && other.is_empty())
            || (self.grid == other.grid && self.start == other.start && self.end == other.end)
    }
}
