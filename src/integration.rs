//! Analytical and numerical integration of splines.
//!
//! The analytical path evaluates closed form moment formulas per interval,
//! written about the interval midpoint so that odd powers integrate to zero
//! and can be skipped. The numerical path applies a fixed order
//! Gauss-Legendre rule per interval for weight functions without a finite
//! closed form.

use nalgebra::{convert, RealField};

use crate::error::{Result, SplineError};
use crate::operators::{IdentityOperator, SplineOperator};
use crate::spline::{powi, Spline};

/// Returns the integral of the spline over the whole real line, calculated
/// analytically. The spline is zero outside its support, so only the support
/// intervals contribute.
pub fn integrate<T: RealField + Copy>(m: &Spline<T>) -> T {
    let points = m.support().points();
    let half: T = convert(0.5);
    let two: T = convert(2.0);
    let mut result = T::zero();
    for (i, c) in m.coefficients().iter().enumerate() {
        let mut pot = (points[i + 1] - points[i]) * half;
        let dxhalf_squared = pot * pot;
        // Odd powers about the midpoint integrate to zero.
        let mut index = 0;
        while index < c.len() {
            result += two * c[index] * pot / convert::<f64, T>((index + 1) as f64);
            pot *= dxhalf_squared;
            index += 2;
        }
    }
    result
}

/// The bilinear form `(m1, m2) -> integral of m1(x) * (O m2)(x)` for a
/// spline operator `O`, calculated analytically over the intersection of the
/// supports.
///
/// Monomial weights are expressed by building the form over
/// [Position](crate::operators::Position) operators, derivative weights over
/// [Derivative](crate::operators::Derivative) operators, and combinations by
/// composing the two.
pub struct BilinearForm<O> {
    operator: O,
}

/// The scalar product `integral of m1(x) * m2(x)`.
pub type ScalarProduct = BilinearForm<IdentityOperator>;

impl<O> BilinearForm<O> {
    pub fn new(operator: O) -> Self {
        BilinearForm { operator }
    }

    /// Evaluates the bilinear form for two splines. The operator acts on the
    /// second argument. Without overlap of the supports the result is zero.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn evaluate<T>(&self, m1: &Spline<T>, m2: &Spline<T>) -> Result<T>
    where
        T: RealField + Copy,
        O: SplineOperator<T>,
    {
        if !m1.support().has_same_grid(m2.support()) {
            return Err(SplineError::DifferingGrids);
        }
        let transformed = self.operator.apply(m2);
        let overlap = m1.support().intersection(transformed.support())?;
        let mut result = T::zero();
        for relative in 0..overlap.interval_count() {
            let absolute = overlap.absolute_from_relative(relative);
            let c1 = &m1.coefficients()[absolute - m1.support().start_index()];
            let c2 = &transformed.coefficients()[absolute - transformed.support().start_index()];
            let points = overlap.points();
            result += integrate_interval(c1, c2, points[relative], points[relative + 1]);
        }
        Ok(result)
    }
}

impl<O: Default> Default for BilinearForm<O> {
    fn default() -> Self {
        BilinearForm::new(O::default())
    }
}

/// The integral of the product of two midpoint centered polynomials over one
/// interval.
fn integrate_interval<T: RealField + Copy>(ca: &[T], cb: &[T], x0: T, x1: T) -> T {
    let half: T = convert(0.5);
    let two: T = convert(2.0);
    let dxhalf = (x1 - x0) * half;
    let mut result = T::zero();
    for (i, &a) in ca.iter().enumerate() {
        for (j, &b) in cb.iter().enumerate() {
            // Odd total powers integrate to zero about the midpoint.
            if (i + j) % 2 != 0 {
                continue;
            }
            let n = i + j + 1;
            result += two * a * b * powi(dxhalf, n) / convert::<f64, T>(n as f64);
        }
    }
    result
}

/// A fixed order Gauss-Legendre quadrature rule. The nodes and weights on
/// `[-1, 1]` are computed once at construction by Newton iteration on the
/// Legendre recurrence and reused for every integration.
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Creates a rule with the given number of quadrature points. A rule
    /// with `n` points integrates polynomials up to degree `2n - 1` exactly.
    ///
    /// # Errors
    /// Returns [SplineError::Undetermined] for a rule without points.
    pub fn new(points: usize) -> Result<Self> {
        if points == 0 {
            return Err(SplineError::Undetermined(
                "a Gauss-Legendre rule needs at least one point".to_string(),
            ));
        }
        let (nodes, weights) = legendre_rule(points);
        Ok(GaussLegendre { nodes, weights })
    }

    /// Number of quadrature points per interval.
    pub fn points(&self) -> usize {
        self.nodes.len()
    }

    /// Evaluates `integral of m1(x) * f(x) * m2(x)` numerically over the
    /// intersection of the supports, for an arbitrary smooth weight function
    /// `f`.
    ///
    /// # Errors
    /// Returns [SplineError::DifferingGrids] if the splines are defined on
    /// differing grids.
    pub fn integrate<T, F>(&self, f: F, m1: &Spline<T>, m2: &Spline<T>) -> Result<T>
    where
        T: RealField + Copy,
        F: Fn(T) -> T,
    {
        if !m1.support().has_same_grid(m2.support()) {
            return Err(SplineError::DifferingGrids);
        }
        let overlap = m1.support().intersection(m2.support())?;
        let half: T = convert(0.5);
        let mut result = T::zero();
        for relative in 0..overlap.interval_count() {
            let absolute = overlap.absolute_from_relative(relative);
            let i1 = absolute - m1.support().start_index();
            let i2 = absolute - m2.support().start_index();
            let points = overlap.points();
            let x0 = points[relative];
            let x1 = points[relative + 1];
            let midpoint = (x0 + x1) * half;
            let halfwidth = (x1 - x0) * half;
            let mut interval_sum = T::zero();
            for (&node, &weight) in self.nodes.iter().zip(self.weights.iter()) {
                let x = midpoint + halfwidth * convert(node);
                interval_sum += convert::<f64, T>(weight)
                    * f(x)
                    * m1.eval_interval(i1, x)
                    * m2.eval_interval(i2, x);
            }
            result += interval_sum * halfwidth;
        }
        Ok(result)
    }
}

/// Nodes and weights of the `n` point Gauss-Legendre rule on `[-1, 1]`.
fn legendre_rule(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    for i in 0..(n + 1) / 2 {
        // Tricomi's approximation of the ith root as the starting point.
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut derivative = 0.0;
        for _ in 0..100 {
            let (value, slope) = legendre(n, x);
            derivative = slope;
            let step = value / slope;
            x -= step;
            if step.abs() < 1.0e-16 {
                break;
            }
        }
        let weight = 2.0 / ((1.0 - x * x) * derivative * derivative);
        nodes[i] = x;
        nodes[n - 1 - i] = -x;
        weights[i] = weight;
        weights[n - 1 - i] = weight;
    }
    (nodes, weights)
}

/// Value and derivative of the `n`th Legendre polynomial via the three term
/// recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut previous = 1.0;
    let mut current = x;
    for k in 2..=n {
        let kf = k as f64;
        let next = ((2.0 * kf - 1.0) * x * current - (kf - 1.0) * previous) / kf;
        previous = current;
        current = next;
    }
    let derivative = n as f64 * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::grid::Grid;
    use crate::operators::{Derivative, OperatorProduct, Position};
    use crate::support::Support;

    fn grid() -> Grid<f64> {
        Grid::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap()
    }

    fn one(grid: &Grid<f64>) -> Spline<f64> {
        let support = Support::whole_grid(grid.clone());
        let coefficients = vec![vec![1.0]; support.interval_count()];
        Spline::new(support, coefficients).unwrap()
    }

    #[test]
    fn test_integrate() {
        let eps = 1e-14;
        let g = grid();
        let constant = one(&g);
        let x = constant.times_x();

        assert_approx_eq!(3.0, integrate(&constant), eps);
        assert_approx_eq!(4.5, integrate(&x), eps);
        assert_approx_eq!(9.0, integrate(&x.multiply(&x).unwrap()), eps);
        assert_eq!(0.0, integrate(&Spline::zero(&g, 2)));
    }

    #[test]
    fn test_scalar_product() {
        let eps = 1e-14;
        let g = grid();
        let constant = one(&g);
        let x = constant.times_x();

        let sp = ScalarProduct::default();
        assert_approx_eq!(3.0, sp.evaluate(&constant, &constant).unwrap(), eps);
        // integral of x^2 over [0, 3]
        assert_approx_eq!(9.0, sp.evaluate(&x, &x).unwrap(), eps);
    }

    #[test]
    fn test_monomial_weights() {
        let eps = 1e-14;
        let g = grid();
        let constant = one(&g);

        // integral of x over [0, 3]
        let form_x = BilinearForm::new(Position::<1>);
        assert_approx_eq!(4.5, form_x.evaluate(&constant, &constant).unwrap(), eps);

        // integral of x^2 over [0, 3]
        let form_x2 = BilinearForm::new(Position::<2>);
        assert_approx_eq!(9.0, form_x2.evaluate(&constant, &constant).unwrap(), eps);
    }

    #[test]
    fn test_derivative_weights() {
        let eps = 1e-14;
        let g = grid();
        let constant = one(&g);
        let x = constant.times_x();
        let x_squared = x.multiply(&x).unwrap();

        // integral of 1 * d/dx x = length of the domain
        let form_dx = BilinearForm::new(Derivative::<1>);
        assert_approx_eq!(3.0, form_dx.evaluate(&constant, &x).unwrap(), eps);

        // integral of 1 * d^2/dx^2 x^2 = 2 * length
        let form_dx2 = BilinearForm::new(Derivative::<2>);
        assert_approx_eq!(6.0, form_dx2.evaluate(&constant, &x_squared).unwrap(), eps);

        // integral of x * d/dx x^2 = 2 * integral of x^2
        let form_x_dx = BilinearForm::new(OperatorProduct::new(Position::<1>, Derivative::<1>));
        assert_approx_eq!(18.0, form_x_dx.evaluate(&constant, &x_squared).unwrap(), eps);
    }

    #[test]
    fn test_no_overlap() {
        let g = grid();
        let left = Spline::new(Support::new(g.clone(), 0, 2).unwrap(), vec![vec![1.0]]).unwrap();
        let right = Spline::new(Support::new(g.clone(), 2, 4).unwrap(), vec![vec![1.0]]).unwrap();

        let sp = ScalarProduct::default();
        assert_eq!(0.0, sp.evaluate(&left, &right).unwrap());
    }

    #[test]
    fn test_differing_grids() {
        let a = one(&grid());
        let b = one(&Grid::new(vec![0.0, 1.0, 2.0, 3.5]).unwrap());

        let sp = ScalarProduct::default();
        assert!(matches!(
            sp.evaluate(&a, &b),
            Err(SplineError::DifferingGrids)
        ));

        let rule = GaussLegendre::new(3).unwrap();
        assert!(matches!(
            rule.integrate(|_| 1.0, &a, &b),
            Err(SplineError::DifferingGrids)
        ));
    }

    #[test]
    fn test_gauss_legendre_construction() {
        assert!(matches!(
            GaussLegendre::new(0),
            Err(SplineError::Undetermined(_))
        ));
        assert_eq!(7, GaussLegendre::new(7).unwrap().points());
    }

    #[test]
    fn test_gauss_legendre_matches_analytical() {
        let eps = 1e-13;
        let g = grid();
        let constant = one(&g);
        let x = constant.times_x();
        let rule = GaussLegendre::new(5).unwrap();

        // Polynomial weights are integrated exactly by the rule.
        let numerical = rule.integrate(|value| value, &constant, &constant).unwrap();
        assert_approx_eq!(4.5, numerical, eps);

        let numerical = rule.integrate(|value| value * value, &x, &x).unwrap();
        let analytical = BilinearForm::new(Position::<2>).evaluate(&x, &x).unwrap();
        assert_approx_eq!(analytical, numerical, eps);
    }

    #[test]
    fn test_gauss_legendre_smooth_weight() {
        let g = grid();
        let constant = one(&g);
        let rule = GaussLegendre::new(10).unwrap();

        let numerical = rule.integrate(|value: f64| value.sin(), &constant, &constant).unwrap();
        assert_approx_eq!(1.0 - 3.0f64.cos(), numerical, 1e-12);
    }
}
