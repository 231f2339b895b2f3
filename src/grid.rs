use std::sync::Arc;

use nalgebra::RealField;

use crate::error::{Result, SplineError};

/// Immutable, strictly increasing sequence of break points. All supports and
/// splines of one computation reference the same grid, which makes their
/// interval boundaries comparable by index instead of by floating point
/// value.
///
/// Cloning a [Grid] is cheap, the underlying storage is reference counted
/// and may be shared across threads.
///
/// # Example
/// ```
/// use bspline_algebra::Grid;
///
/// let grid = Grid::new(vec![0.0, 0.5, 2.0]).unwrap();
/// assert_eq!(3, grid.len());
/// assert!(Grid::new(vec![0.0, 0.5, 0.5]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Grid<T> {
    data: Arc<[T]>,
}

impl<T: RealField + Copy> Grid<T> {
    /// Creates a grid from break point values.
    ///
    /// # Errors
    /// Returns [SplineError::InvalidGrid] if the values are not strictly
    /// increasing.
    pub fn new(values: Vec<T>) -> Result<Self> {
        if values.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SplineError::InvalidGrid);
        }
        Ok(Grid {
            data: values.into(),
        })
    }

    /// Creates a grid from a sorted knot sequence, dropping repeated values.
    /// Repeated knots carry meaning for B-spline generation but never appear
    /// on the grid itself.
    ///
    /// # Errors
    /// Returns [SplineError::InvalidGrid] if the knots are not sorted.
    pub fn from_knots(knots: &[T]) -> Result<Self> {
        let mut values: Vec<T> = Vec::with_capacity(knots.len());
        for &knot in knots {
            if values.last() != Some(&knot) {
                values.push(knot);
            }
        }
        Grid::new(values)
    }

    /// Constructor for values that are strictly increasing by construction.
    pub(crate) fn new_unchecked(values: Vec<T>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Grid {
            data: values.into(),
        }
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The grid points as a slice.
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Returns the `index`th grid point, checking bounds.
    ///
    /// # Errors
    /// Returns [SplineError::IndexOutOfRange] on an access beyond the grid.
    pub fn at(&self, index: usize) -> Result<T> {
        self.data
            .get(index)
            .copied()
            .ok_or(SplineError::IndexOutOfRange {
                index,
                len: self.data.len(),
            })
    }

    pub fn front(&self) -> Option<T> {
        self.data.first().copied()
    }

    pub fn back(&self) -> Option<T> {
        self.data.last().copied()
    }

    /// Returns the index of the grid point equal to `x`.
    ///
    /// # Errors
    /// Returns [SplineError::InconsistentData] if `x` is not a grid point.
    pub fn find(&self, x: T) -> Result<usize> {
        let index = self.data.partition_point(|p| *p < x);
        if index < self.data.len() && self.data[index] == x {
            Ok(index)
        } else {
            Err(SplineError::InconsistentData(
                "value is not a grid point".to_string(),
            ))
        }
    }
}

impl<T: RealField + Copy> PartialEq for Grid<T> {
    fn eq(&self, other: &Self) -> bool {
        // Identity fast path; the elementwise fallback keeps distinct
        // allocations with identical content equal.
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}
