use nalgebra::RealField;

use crate::error::{Result, SplineError};
use crate::grid::Grid;
use crate::spline::Spline;
use crate::support::Support;

/// Generates B-spline basis functions from a knot sequence via the Cox-de
/// Boor recursion.
///
/// The knot sequence may contain repeated values; each repetition reduces
/// the continuity of the generated basis at that point. The grid is the knot
/// sequence with repetitions removed.
///
/// Instead of recursing naively, the generator builds the basis bottom up,
/// order by order, so that shared lower order B-splines are computed once
/// when a full basis set is requested.
///
/// # Example
/// ```
/// use bspline_algebra::BSplineGenerator;
/// use assert_approx_eq::assert_approx_eq;
///
/// let generator = BSplineGenerator::new(vec![0.0_f64, 1.0, 2.0, 3.0]).unwrap();
/// let basis = generator.generate_all(3).unwrap();
///
/// assert_eq!(1, basis.len());
/// assert_eq!(2, basis[0].order());
/// assert_approx_eq!(0.75, basis[0].eval(1.5), 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct BSplineGenerator<T> {
    grid: Grid<T>,
    knots: Vec<T>,
}

impl<T: RealField + Copy> BSplineGenerator<T> {
    /// Creates a generator, deriving the grid from the knot sequence.
    ///
    /// # Errors
    /// Returns [SplineError::InvalidGrid] if the knots are not sorted.
    pub fn new(knots: Vec<T>) -> Result<Self> {
        let grid = Grid::from_knots(&knots)?;
        Ok(BSplineGenerator { grid, knots })
    }

    /// Creates a generator with an externally supplied grid.
    ///
    /// # Errors
    /// Returns [SplineError::InconsistentData] if the supplied grid does not
    /// match the grid derived from the knots.
    pub fn with_grid(knots: Vec<T>, grid: Grid<T>) -> Result<Self> {
        let derived = Grid::from_knots(&knots)?;
        if derived != grid {
            return Err(SplineError::InconsistentData(
                "the supplied grid does not match the grid derived from the knots".to_string(),
            ));
        }
        Ok(BSplineGenerator { grid, knots })
    }

    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn knots(&self) -> &[T] {
        &self.knots
    }

    /// Generates the B-spline of order `k - 1` at knot index `i`, where `k`
    /// is the number of coefficients per interval.
    ///
    /// # Errors
    /// Returns [SplineError::Undetermined] if `k` is zero or if `k == 1` is
    /// requested on a zero width knot interval, and
    /// [SplineError::IndexOutOfRange] if the knot sequence holds too few
    /// elements beyond `i`.
    pub fn generate(&self, i: usize, k: usize) -> Result<Spline<T>> {
        if k == 0 {
            return Err(SplineError::Undetermined(
                "the order parameter k must be at least 1".to_string(),
            ));
        }
        if i + k >= self.knots.len() {
            return Err(SplineError::IndexOutOfRange {
                index: i + k,
                len: self.knots.len(),
            });
        }
        if k == 1 {
            return self.indicator(i, true);
        }
        let mut level = Vec::with_capacity(k);
        for j in i..i + k {
            level.push(self.indicator(j, false)?);
        }
        for kk in 2..=k {
            let mut next = Vec::with_capacity(level.len() - 1);
            for j in 0..level.len() - 1 {
                next.push(self.combine(&level[j], &level[j + 1], i + j, kk));
            }
            level = next;
        }
        debug_assert!(level.len() == 1);
        Ok(level.remove(0))
    }

    /// Generates all B-splines of order `k - 1` the knot sequence supports,
    /// one for each index in `[0, knot_count - k)`.
    ///
    /// # Errors
    /// Returns [SplineError::Undetermined] if the knot sequence holds fewer
    /// than `k` elements, or if `k == 1` and the sequence contains repeated
    /// knots.
    pub fn generate_all(&self, k: usize) -> Result<Vec<Spline<T>>> {
        if k == 0 {
            return Err(SplineError::Undetermined(
                "the order parameter k must be at least 1".to_string(),
            ));
        }
        if self.knots.len() < k {
            return Err(SplineError::Undetermined(format!(
                "{} knots are too few to generate B-splines with {} coefficients per interval",
                self.knots.len(),
                k
            )));
        }
        let strict = k == 1;
        let mut level = Vec::with_capacity(self.knots.len().saturating_sub(1));
        for i in 0..self.knots.len().saturating_sub(1) {
            level.push(self.indicator(i, strict)?);
        }
        for kk in 2..=k {
            let mut next = Vec::with_capacity(level.len() - 1);
            for j in 0..level.len() - 1 {
                next.push(self.combine(&level[j], &level[j + 1], j, kk));
            }
            level = next;
        }
        Ok(level)
    }

    /// The order zero B-spline: the constant one indicator function over the
    /// grid interval `[knots[i], knots[i + 1])`. A zero width knot interval
    /// yields the zero spline inside the bottom up build, or fails when
    /// requested directly.
    fn indicator(&self, i: usize, strict: bool) -> Result<Spline<T>> {
        let xi = self.knots[i];
        let xip1 = self.knots[i + 1];
        if xi >= xip1 {
            if strict {
                return Err(SplineError::Undetermined(format!(
                    "knot interval {i} has zero width"
                )));
            }
            return Ok(Spline::zero(&self.grid, 0));
        }
        let start = self.grid.find(xi)?;
        let support = Support::new(self.grid.clone(), start, start + 2)?;
        Spline::new(support, vec![vec![T::one()]])
    }

    /// One step of the Cox-de Boor relation:
    /// `B_{i,kk} = w1 * B_{i,kk-1} + w2 * B_{i+1,kk-1}` with the linear
    /// weights `w1 = (x - knots[i]) / (knots[i+kk-1] - knots[i])` and
    /// `w2 = (knots[i+kk] - x) / (knots[i+kk] - knots[i+1])`. A term with a
    /// zero denominator, arising from repeated knots, is omitted.
    fn combine(&self, b1: &Spline<T>, b2: &Spline<T>, i: usize, kk: usize) -> Spline<T> {
        let mut result = Spline::zero(&self.grid, kk - 1);

        let xi = self.knots[i];
        let xikm1 = self.knots[i + kk - 1];
        if xikm1 > xi {
            let prefactor = T::one() / (xikm1 - xi);
            let scaled = b1.scaled(prefactor);
            result = result.merge_add(&scaled.times_x().merge_add(&scaled.scaled(-xi)));
        }

        let xip1 = self.knots[i + 1];
        let xik = self.knots[i + kk];
        if xik > xip1 {
            let prefactor = T::one() / (xik - xip1);
            let scaled = b2.scaled(prefactor);
            result = result.merge_add(
                &scaled
                    .scaled(xik)
                    .merge_add(&scaled.times_x().scaled(-T::one())),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;

    use super::*;

    #[test]
    fn test_grid_derivation() {
        let generator = BSplineGenerator::new(vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0]).unwrap();

        assert_eq!(&[0.0, 1.0, 2.0], generator.grid().values());
        assert_eq!(7, generator.knots().len());
    }

    #[test]
    fn test_with_grid_consistency() {
        let knots = vec![0.0, 0.0, 1.0, 2.0];
        let matching = Grid::new(vec![0.0, 1.0, 2.0]).unwrap();
        let mismatching = Grid::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap();

        assert!(BSplineGenerator::with_grid(knots.clone(), matching).is_ok());
        assert!(matches!(
            BSplineGenerator::with_grid(knots, mismatching),
            Err(SplineError::InconsistentData(_))
        ));
    }

    #[test]
    fn test_order_zero() {
        let generator = BSplineGenerator::new(vec![0.0, 1.0, 2.0]).unwrap();
        let indicator = generator.generate(1, 1).unwrap();

        assert_eq!(0, indicator.order());
        assert_eq!(1.0, indicator.eval(1.5));
        assert_eq!(0.0, indicator.eval(0.5));
    }

    #[test]
    fn test_order_zero_degenerate() {
        let generator = BSplineGenerator::new(vec![0.0, 1.0, 1.0, 2.0]).unwrap();

        assert!(matches!(
            generator.generate(1, 1),
            Err(SplineError::Undetermined(_))
        ));
        assert!(matches!(
            generator.generate_all(1),
            Err(SplineError::Undetermined(_))
        ));
    }

    #[test]
    fn test_hat_function() {
        let eps = 1e-15;
        let generator = BSplineGenerator::new(vec![0.0_f64, 1.0, 3.0]).unwrap();
        let hat = generator.generate(0, 2).unwrap();

        assert_eq!(1, hat.order());
        assert_approx_eq!(0.0, hat.eval(0.0), eps);
        assert_approx_eq!(0.5, hat.eval(0.5), eps);
        assert_approx_eq!(1.0, hat.eval(1.0), eps);
        assert_approx_eq!(0.5, hat.eval(2.0), eps);
        assert_approx_eq!(0.0, hat.eval(3.0), eps);
    }

    #[test]
    fn test_quadratic_uniform() {
        let eps = 1e-15;
        let generator = BSplineGenerator::new(vec![0.0_f64, 1.0, 2.0, 3.0]).unwrap();
        let spline = generator.generate(0, 3).unwrap();

        assert_eq!(2, spline.order());
        assert_approx_eq!(0.0, spline.eval(0.0), eps);
        assert_approx_eq!(0.125, spline.eval(0.5), eps);
        assert_approx_eq!(0.5, spline.eval(1.0), eps);
        assert_approx_eq!(0.75, spline.eval(1.5), eps);
        assert_approx_eq!(0.5, spline.eval(2.0), eps);
        assert_approx_eq!(0.125, spline.eval(2.5), eps);
        assert_approx_eq!(0.0, spline.eval(3.0), eps);
    }

    #[test]
    fn test_repeated_knot_reduces_continuity() {
        let eps = 1e-15;
        let generator = BSplineGenerator::new(vec![0.0_f64, 1.0, 1.0, 2.0]).unwrap();

        // With the repeated knot at 1 the first linear B-spline collapses to
        // a ramp on [0, 1) and the second to a ramp on [1, 2).
        let left = generator.generate(0, 2).unwrap();
        assert_approx_eq!(0.5, left.eval(0.5), eps);
        assert_approx_eq!(0.0, left.eval(1.5), eps);

        let right = generator.generate(1, 2).unwrap();
        assert_approx_eq!(0.0, right.eval(0.5), eps);
        assert_approx_eq!(0.5, right.eval(1.5), eps);
        assert_approx_eq!(0.0, right.eval(2.0), eps);
    }

    #[test]
    fn test_generate_all_matches_generate() {
        let knots = vec![0.0, 0.5, 1.25, 2.0, 3.0, 4.5, 5.0];
        let generator = BSplineGenerator::new(knots.clone()).unwrap();

        for k in 1..=4 {
            let basis = generator.generate_all(k).unwrap();
            assert_eq!(knots.len() - k, basis.len());
            for (i, spline) in basis.iter().enumerate() {
                let single = generator.generate(i, k).unwrap();
                assert_eq!(single.order(), spline.order());
                assert_eq!(single.coefficients(), spline.coefficients());
            }
        }
    }

    #[test]
    fn test_too_few_knots() {
        let generator = BSplineGenerator::new(vec![0.0, 1.0]).unwrap();

        assert!(matches!(
            generator.generate_all(3),
            Err(SplineError::Undetermined(_))
        ));
        assert!(matches!(
            generator.generate(0, 0),
            Err(SplineError::Undetermined(_))
        ));
        assert!(matches!(
            generator.generate(0, 2),
            Err(SplineError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_partition_of_unity_interior() {
        let tol = 1e-14;
        let mut rng = rand::thread_rng();
        let generator = BSplineGenerator::new(vec![
            0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0,
        ])
        .unwrap();

        for k in [2, 3, 4] {
            let basis = generator.generate_all(k).unwrap();
            // The partition of unity holds between the (k-1)th knot from
            // either end.
            let lower = generator.knots()[k - 1];
            let upper = generator.knots()[generator.knots().len() - k];
            for _ in 0..200 {
                let x = rng.gen_range(lower..upper);
                let sum: f64 = basis.iter().map(|b| b.eval(x)).sum();
                assert_approx_eq!(1.0, sum, tol);
            }
        }
    }

    #[test]
    fn test_partition_of_unity_clamped() {
        let tol = 1e-14;
        let mut rng = rand::thread_rng();
        let generator = BSplineGenerator::new(vec![
            0.0, 0.0, 0.0, 1.0, 2.5, 3.0, 4.0, 4.0, 4.0,
        ])
        .unwrap();

        let basis = generator.generate_all(3).unwrap();
        assert_eq!(6, basis.len());
        // Boundary knots repeated k times extend the partition of unity to
        // the whole knot range.
        for _ in 0..200 {
            let x = rng.gen_range(0.0..4.0);
            let sum: f64 = basis.iter().map(|b| b.eval(x)).sum();
            assert_approx_eq!(1.0, sum, tol);
        }
    }
}
