use std::ops::{Div, DivAssign, Mul, MulAssign};

use nalgebra::{convert, RealField};

use crate::error::{Result, SplineError};
use crate::grid::Grid;
use crate::support::Support;

/// A polynomial defined piecewise over a [Support], with one coefficient
/// vector per interval. Coefficient vector `i` encodes the polynomial
/// `sum_k c[k] * (x - xm_i)^k` where `xm_i` is the midpoint of interval `i`.
/// Outside its support a spline is implicitly zero.
///
/// The polynomial order is a runtime property; every coefficient vector has
/// length `order + 1`, zero coefficients included.
#[derive(Debug, Clone)]
pub struct Spline<T> {
    support: Support<T>,
    order: usize,
    coefficients: Vec<Vec<T>>,
}

impl<T: RealField + Copy> Spline<T> {
    /// Creates a spline from a support and matching coefficient vectors. The
    /// order is taken from the length of the coefficient vectors.
    ///
    /// # Example
    /// ```
    /// use bspline_algebra::{Grid, Spline, Support};
    ///
    /// let grid = Grid::new(vec![0.0, 1.0, 2.0]).unwrap();
    /// let support = Support::whole_grid(grid);
    /// // f(x) = x on [0, 2], written about the interval midpoints.
    /// let spline = Spline::new(support, vec![vec![0.5, 1.0], vec![1.5, 1.0]]).unwrap();
    /// assert_eq!(1, spline.order());
    /// assert_eq!(0.25, spline.eval(0.25));
    /// ```
    ///
    /// # Errors
    /// Returns [SplineError::InconsistentData] if the number of coefficient
    /// vectors differs from the number of support intervals or the vectors
    /// are not all of the same non-zero length.
    pub fn new(support: Support<T>, coefficients: Vec<Vec<T>>) -> Result<Self> {
        if coefficients.len() != support.interval_count() {
            return Err(SplineError::InconsistentData(format!(
                "expected {} coefficient vectors, got {}",
                support.interval_count(),
                coefficients.len()
            )));
        }
        let order = match coefficients.first() {
            Some(first) if first.is_empty() => {
                return Err(SplineError::InconsistentData(
                    "coefficient vectors must not be empty".to_string(),
                ))
            }
            Some(first) => first.len() - 1,
            None => 0,
        };
        if coefficients.iter().any(|c| c.len() != order + 1) {
            return Err(SplineError::InconsistentData(
                "coefficient vectors must all have the same length".to_string(),
            ));
        }
        Ok(Spline {
            support,
            order,
            coefficients,
        })
    }

    /// The zero spline of the given order on `grid`. It has an empty support
    /// and no coefficients.
    pub fn zero(grid: &Grid<T>, order: usize) -> Self {
        Spline {
            support: Support::empty(grid.clone()),
            order,
            coefficients: Vec::new(),
        }
    }

    /// Constructor for data that satisfies the invariants by construction.
    pub(crate) fn from_parts(support: Support<T>, order: usize, coefficients: Vec<Vec<T>>) -> Self {
        debug_assert!(coefficients.len() == support.interval_count());
        debug_assert!(coefficients.iter().all(|c| c.len() == order + 1));
        Spline {
            support,
            order,
            coefficients,
        }
    }

    pub fn support(&self) -> &Support<T> {
        &self.support
    }

    /// Polynomial order of the spline. Each interval carries `order + 1`
    /// coefficients.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Coefficient vectors, one per support interval.
    pub fn coefficients(&self) -> &[Vec<T>] {
        &self.coefficients
    }

    /// Evaluates the spline at `x`. Outside the support the result is
    /// exactly zero.
    pub fn eval(&self, x: T) -> T {
        let points = self.support.points();
        if points.len() < 2 {
            return T::zero();
        }
        if !(x >= points[0] && x <= points[points.len() - 1]) {
            return T::zero();
        }
        // The rightmost interval whose start lies at or below x.
        let intervals = points.len() - 1;
        let interval = points[..intervals].partition_point(|p| *p <= x) - 1;
        let half: T = convert(0.5);
        let midpoint = (points[interval] + points[interval + 1]) * half;
        horner(&self.coefficients[interval], x - midpoint)
    }

    /// Evaluates the polynomial of one interval without searching for the
    /// interval containing `x`.
    pub(crate) fn eval_interval(&self, interval: usize, x: T) -> T {
        let points = self.support.points();
        debug_assert!(interval + 1 < points.len());
        let half: T = convert(0.5);
        let midpoint = (points[interval] + points[interval + 1]) * half;
        horner(&self.coefficients[interval], x - midpoint)
    }

    /// Whether this spline returns zero for every x. True if the support
    /// holds no interval or all coefficients are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().flatten().all(|c| *c == T::zero())
    }

    /// Whether the supports of the two splines share at least one interval.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn overlaps(&self, other: &Spline<T>) -> Result<bool> {
        if !self.support.has_same_grid(&other.support) {
            return Err(SplineError::DifferingGrids);
        }
        Ok(self
            .support
            .intersection_unchecked(&other.support)
            .has_intervals())
    }

    /// Sums up two splines. The supports may differ but the grids must
    /// match; the result lives on the union of the supports with the
    /// shorter coefficient vectors zero padded to order
    /// `max(self.order, other.order)`.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn add(&self, other: &Spline<T>) -> Result<Spline<T>> {
        if !self.support.has_same_grid(&other.support) {
            return Err(SplineError::DifferingGrids);
        }
        Ok(self.merge_add(other))
    }

    /// Subtracts `other` from this spline.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn sub(&self, other: &Spline<T>) -> Result<Spline<T>> {
        self.add(&other.scaled(-T::one()))
    }

    /// Adds `other` to this spline in place. If the supports and orders
    /// match, the coefficient storage is accumulated directly; otherwise the
    /// spline is rebuilt on the union of the supports.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn add_assign(&mut self, other: &Spline<T>) -> Result<()> {
        if !self.support.has_same_grid(&other.support) {
            return Err(SplineError::DifferingGrids);
        }
        if self.support == other.support && other.order <= self.order {
            for (c, oc) in self.coefficients.iter_mut().zip(other.coefficients.iter()) {
                for (v, &ov) in c.iter_mut().zip(oc.iter()) {
                    *v += ov;
                }
            }
        } else {
            *self = self.merge_add(other);
        }
        Ok(())
    }

    /// Subtracts `other` from this spline in place.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn sub_assign(&mut self, other: &Spline<T>) -> Result<()> {
        self.add_assign(&other.scaled(-T::one()))
    }

    /// Sum over the merged support, assuming equivalent grids.
    pub(crate) fn merge_add(&self, other: &Spline<T>) -> Spline<T> {
        debug_assert!(self.support.has_same_grid(&other.support));
        let support = self.support.union_unchecked(&other.support);
        let order = self.order.max(other.order);
        let mut coefficients = Vec::with_capacity(support.interval_count());
        for relative in 0..support.interval_count() {
            let absolute = support.absolute_from_relative(relative);
            let mut c = vec![T::zero(); order + 1];
            if let Some(i) = self.support.interval_from_absolute(absolute) {
                for (v, &sv) in c.iter_mut().zip(self.coefficients[i].iter()) {
                    *v += sv;
                }
            }
            if let Some(i) = other.support.interval_from_absolute(absolute) {
                for (v, &ov) in c.iter_mut().zip(other.coefficients[i].iter()) {
                    *v += ov;
                }
            }
            coefficients.push(c);
        }
        Spline::from_parts(support, order, coefficients)
    }

    /// Multiplies two splines. The result has order
    /// `self.order + other.order` and lives on the intersection of the
    /// supports; each coefficient vector is the convolution of the two input
    /// vectors. Without overlap the zero spline of the summed order is
    /// returned.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn multiply(&self, other: &Spline<T>) -> Result<Spline<T>> {
        if !self.support.has_same_grid(&other.support) {
            return Err(SplineError::DifferingGrids);
        }
        let order = self.order + other.order;
        let overlap = self.support.intersection_unchecked(&other.support);
        if !overlap.has_intervals() {
            return Ok(Spline::zero(self.support.grid(), order));
        }
        let mut coefficients = Vec::with_capacity(overlap.interval_count());
        for relative in 0..overlap.interval_count() {
            let absolute = overlap.absolute_from_relative(relative);
            let a = &self.coefficients[absolute - self.support.start_index()];
            let b = &other.coefficients[absolute - other.support.start_index()];
            let mut c = vec![T::zero(); order + 1];
            for (j, &aj) in a.iter().enumerate() {
                for (k, &bk) in b.iter().enumerate() {
                    c[j + k] += aj * bk;
                }
            }
            coefficients.push(c);
        }
        Ok(Spline::from_parts(overlap, order, coefficients))
    }

    /// Returns the spline multiplied by a scalar.
    pub fn scaled(&self, factor: T) -> Spline<T> {
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| c.iter().map(|&v| v * factor).collect())
            .collect();
        Spline::from_parts(self.support.clone(), self.order, coefficients)
    }

    /// Returns the `n`th derivative of the spline. The support does not
    /// change; a derivative order beyond the polynomial order yields the
    /// zero spline of order 0.
    pub fn derivative(&self, n: usize) -> Spline<T> {
        if n == 0 {
            return self.clone();
        }
        if n > self.order {
            return Spline::zero(self.support.grid(), 0);
        }
        let order = self.order - n;
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| {
                (n..=self.order)
                    .map(|i| falling_factorial::<T>(i, n) * c[i])
                    .collect()
            })
            .collect();
        Spline::from_parts(self.support.clone(), order, coefficients)
    }

    /// Returns the spline `g(x) = x * f(x)`. The order grows by one; each
    /// interval mixes its own midpoint into the coefficient recurrence.
    pub fn times_x(&self) -> Spline<T> {
        let points = self.support.points();
        let half: T = convert(0.5);
        let mut coefficients = Vec::with_capacity(self.coefficients.len());
        for (i, c) in self.coefficients.iter().enumerate() {
            let midpoint = (points[i] + points[i + 1]) * half;
            let mut nc = vec![T::zero(); self.order + 2];
            for (j, v) in nc.iter_mut().enumerate() {
                if j > 0 {
                    *v += c[j - 1];
                }
                if j <= self.order {
                    *v += midpoint * c[j];
                }
            }
            coefficients.push(nc);
        }
        Spline::from_parts(self.support.clone(), self.order + 1, coefficients)
    }

    /// Restricts the spline to the intervals fully contained in `[x0, x1]`.
    /// Partial intervals at the edges are dropped entirely, not clipped;
    /// clipping would move break points off the grid.
    pub fn restrict_support(&self, x0: T, x1: T) -> Spline<T> {
        let points = self.support.points();
        let mut first = None;
        let mut last = None;
        for i in 0..self.support.interval_count() {
            if points[i] >= x0 && points[i + 1] <= x1 {
                if first.is_none() {
                    first = Some(i);
                }
                last = Some(i);
            }
        }
        match (first, last) {
            (Some(first), Some(last)) => {
                let start = self.support.start_index() + first;
                let support = Support::from_range_unchecked(
                    self.support.grid().clone(),
                    start,
                    start + last - first + 2,
                );
                let coefficients = self.coefficients[first..=last].to_vec();
                Spline::from_parts(support, self.order, coefficients)
            }
            _ => Spline::zero(self.support.grid(), self.order),
        }
    }

    /// Returns the spline `g(x) = f(-x)`. The reflected spline is defined on
    /// a new grid with negated, reversed break points; unless the original
    /// grid is symmetric about zero it must not be combined with splines on
    /// the original grid.
    pub fn invert(&self) -> Spline<T> {
        let grid = self.support.grid();
        let reflected: Vec<T> = grid.values().iter().rev().map(|&v| -v).collect();
        let reflected = Grid::new_unchecked(reflected);
        if self.support.is_empty() {
            return Spline::zero(&reflected, self.order);
        }
        let start = grid.len() - self.support.end_index();
        let end = grid.len() - self.support.start_index();
        let support = Support::from_range_unchecked(reflected, start, end);
        let coefficients = self
            .coefficients
            .iter()
            .rev()
            .map(|c| {
                c.iter()
                    .enumerate()
                    // Odd powers flip their sign under reflection.
                    .map(|(j, &v)| if j % 2 == 0 { v } else { -v })
                    .collect()
            })
            .collect();
        Spline::from_parts(support, self.order, coefficients)
    }

    /// Converts the scalar type of the spline through `f`, which is applied
    /// to grid points and coefficients alike.
    ///
    /// # Errors
    /// Returns [SplineError::InvalidGrid] if the converted grid points are
    /// no longer strictly increasing.
    pub fn map_scalar<U, F>(&self, f: F) -> Result<Spline<U>>
    where
        U: RealField + Copy,
        F: Fn(T) -> U,
    {
        let grid = Grid::new(self.support.grid().values().iter().map(|&v| f(v)).collect())?;
        let support = Support::new(grid, self.support.start_index(), self.support.end_index())?;
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| c.iter().map(|&v| f(v)).collect())
            .collect();
        Ok(Spline {
            support,
            order: self.order,
            coefficients,
        })
    }
}

impl<T: RealField + Copy> Mul<T> for &Spline<T> {
    type Output = Spline<T>;

    fn mul(self, factor: T) -> Spline<T> {
        self.scaled(factor)
    }
}

impl<T: RealField + Copy> Mul<T> for Spline<T> {
    type Output = Spline<T>;

    fn mul(self, factor: T) -> Spline<T> {
        self.scaled(factor)
    }
}

impl<T: RealField + Copy> Div<T> for &Spline<T> {
    type Output = Spline<T>;

    fn div(self, divisor: T) -> Spline<T> {
        self.scaled(T::one() / divisor)
    }
}

impl<T: RealField + Copy> MulAssign<T> for Spline<T> {
    fn mul_assign(&mut self, factor: T) {
        for c in &mut self.coefficients {
            for v in c {
                *v *= factor;
            }
        }
    }
}

impl<T: RealField + Copy> DivAssign<T> for Spline<T> {
    fn div_assign(&mut self, divisor: T) {
        *self *= T::one() / divisor;
    }
}

/// Evaluates a midpoint centered coefficient vector at distance `dx` from
/// the midpoint.
fn horner<T: RealField + Copy>(coefficients: &[T], dx: T) -> T {
    let mut result = T::zero();
    for &c in coefficients.iter().rev() {
        result = result * dx + c;
    }
    result
}

/// The falling factorial `power * (power - 1) * ... * (power - n + 1)`
/// arising when differentiating a monomial `n` times.
pub(crate) fn falling_factorial<T: RealField + Copy>(power: usize, n: usize) -> T {
    let mut factor = T::one();
    for j in 0..n {
        factor *= convert::<f64, T>((power - j) as f64);
    }
    factor
}

/// Efficient integer power by squaring.
pub(crate) fn powi<T: RealField + Copy>(base: T, exponent: usize) -> T {
    let mut result = T::one();
    let mut square = base;
    let mut bit = 1usize;
    while bit <= exponent {
        if exponent & bit == bit {
            result *= square;
        }
        bit <<= 1;
        square *= square;
    }
    result
}
