//! Interpolation of sample points by a spline of a requested order.
//!
//! The sample abscissae are the grid points of a [Support]; the coefficients
//! of the interpolating spline are determined by a dense linear system built
//! from value, continuity and boundary closure equations and handed to a
//! [LinearSolver] backend.

use nalgebra::{DMatrix, DVector, RealField};

use crate::error::{Result, SplineError};
use crate::spline::{falling_factorial, powi, Spline};
use crate::support::Support;

/// Capability to solve a dense square linear system `A * c = y`.
///
/// The interpolation routines are agnostic to the backend; any
/// decomposition that reports singular systems can be plugged in.
pub trait LinearSolver<T: RealField> {
    /// Returns the solution of the system, or [None] if the matrix is
    /// singular.
    fn solve(&self, matrix: DMatrix<T>, rhs: DVector<T>) -> Option<DVector<T>>;
}

/// Solver backend based on LU decomposition with partial pivoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuSolver;

impl<T: RealField> LinearSolver<T> for LuSolver {
    fn solve(&self, matrix: DMatrix<T>, rhs: DVector<T>) -> Option<DVector<T>> {
        matrix.lu().solve(&rhs)
    }
}

/// Solver backend based on column pivoted QR decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrSolver;

impl<T: RealField> LinearSolver<T> for QrSolver {
    fn solve(&self, matrix: DMatrix<T>, rhs: DVector<T>) -> Option<DVector<T>> {
        matrix.col_piv_qr().solve(&rhs)
    }
}

/// Interpolates the sample values given at the grid points of `support` by
/// a spline of the requested order, using the [LuSolver] backend.
///
/// # Example
/// ```
/// use bspline_algebra::{interpolation, Grid, Support};
/// use assert_approx_eq::assert_approx_eq;
///
/// let grid = Grid::new(vec![0.0_f64, 1.0, 2.0]).unwrap();
/// let support = Support::whole_grid(grid);
/// let spline = interpolation::interpolate(&support, &[0.0, 1.0, 4.0], 2).unwrap();
///
/// assert_approx_eq!(1.0, spline.eval(1.0), 1e-12);
/// assert_approx_eq!(4.0, spline.eval(2.0), 1e-12);
/// ```
///
/// # Errors
/// See [interpolate_with].
pub fn interpolate<T: RealField + Copy>(
    support: &Support<T>,
    values: &[T],
    order: usize,
) -> Result<Spline<T>> {
    interpolate_with(&LuSolver, support, values, order)
}

/// Interpolates the sample values given at the grid points of `support` by
/// a spline of the requested order, solving the linear system with the
/// given backend.
///
/// Per interval the spline carries `order + 1` midpoint centered
/// coefficients. The system consists of the interval endpoint values, the
/// continuity of the derivatives up to `order - 1` at the interior grid
/// points, and `order - 1` closure equations zeroing the highest derivatives
/// alternately at the first and last abscissa.
///
/// # Errors
/// Returns [SplineError::InconsistentData] if the number of values differs
/// from the number of support points, and [SplineError::Undetermined] if
/// fewer than two points are given, the order is zero, or the system is
/// singular.
pub fn interpolate_with<T, S>(
    solver: &S,
    support: &Support<T>,
    values: &[T],
    order: usize,
) -> Result<Spline<T>>
where
    T: RealField + Copy,
    S: LinearSolver<T>,
{
    if values.len() != support.size() {
        return Err(SplineError::InconsistentData(format!(
            "expected {} sample values, got {}",
            support.size(),
            values.len()
        )));
    }
    if support.size() < 2 {
        return Err(SplineError::Undetermined(
            "interpolation needs at least two sample points".to_string(),
        ));
    }
    if order == 0 {
        return Err(SplineError::Undetermined(
            "interpolation needs at least order 1".to_string(),
        ));
    }

    let points = support.points();
    let intervals = support.interval_count();
    let coefficients_per_interval = order + 1;
    let matrix_size = intervals * coefficients_per_interval;

    let mut matrix = DMatrix::<T>::zeros(matrix_size, matrix_size);
    let mut rhs = DVector::<T>::zeros(matrix_size);
    let mut equation = 0;

    let half: T = nalgebra::convert(0.5);
    let halfwidth = |i: usize| (points[i + 1] - points[i]) * half;

    // Interval endpoint values.
    for i in 0..intervals {
        let h = halfwidth(i);
        for (dx, y) in [(-h, values[i]), (h, values[i + 1])] {
            for c in 0..coefficients_per_interval {
                matrix[(equation, i * coefficients_per_interval + c)] = powi(dx, c);
            }
            rhs[equation] = y;
            equation += 1;
        }
    }

    // Continuity of the derivatives at the interior grid points.
    for i in 0..intervals - 1 {
        let left_dx = halfwidth(i);
        let right_dx = -halfwidth(i + 1);
        for d in 1..order {
            for c in 0..coefficients_per_interval {
                matrix[(equation, i * coefficients_per_interval + c)] =
                    derivative_term(c, d, left_dx);
                matrix[(equation, (i + 1) * coefficients_per_interval + c)] =
                    -derivative_term(c, d, right_dx);
            }
            equation += 1;
        }
    }

    // Closure: zero the highest derivatives alternately at the first and
    // last abscissa.
    for j in 0..order - 1 {
        let d = order - 1 - j / 2;
        let (interval, dx) = if j % 2 == 0 {
            (0, -halfwidth(0))
        } else {
            (intervals - 1, halfwidth(intervals - 1))
        };
        for c in 0..coefficients_per_interval {
            matrix[(equation, interval * coefficients_per_interval + c)] =
                derivative_term(c, d, dx);
        }
        equation += 1;
    }
    debug_assert!(equation == matrix_size);

    let solution = solver.solve(matrix, rhs).ok_or_else(|| {
        SplineError::Undetermined("the interpolation system is singular".to_string())
    })?;

    let coefficients = (0..intervals)
        .map(|i| {
            (0..coefficients_per_interval)
                .map(|c| solution[i * coefficients_per_interval + c])
                .collect()
        })
        .collect();
    Spline::new(support.clone(), coefficients)
}

/// Coefficient of the `d`th derivative of the monomial `(x - xm)^c` at
/// distance `dx` from the midpoint.
fn derivative_term<T: RealField + Copy>(c: usize, d: usize, dx: T) -> T {
    if c < d {
        T::zero()
    } else {
        falling_factorial::<T>(c, d) * powi(dx, c - d)
    }
}
