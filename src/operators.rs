//! Composable linear transforms on splines.
//!
//! An operator maps a spline to a spline of an order that is a pure function
//! of the input order and the operator's own degree. Operators can be scaled
//! by scalars, summed and composed; applying a composite operator is
//! equivalent to applying each term and summing the results.

use nalgebra::RealField;

use crate::spline::Spline;

/// A linear transform on splines.
pub trait SplineOperator<T: RealField + Copy> {
    /// Polynomial order of the spline obtained by applying this operator to
    /// a spline of order `input_order`.
    fn output_order(&self, input_order: usize) -> usize;

    /// Applies the operator to a spline.
    fn apply(&self, spline: &Spline<T>) -> Spline<T>;
}

/// The operator leaving a spline unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOperator;

impl<T: RealField + Copy> SplineOperator<T> for IdentityOperator {
    fn output_order(&self, input_order: usize) -> usize {
        input_order
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        spline.clone()
    }
}

/// The derivative operator of order `N`. It reduces the polynomial order by
/// `N`, clamped at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Derivative<const N: usize>;

impl<T: RealField + Copy, const N: usize> SplineOperator<T> for Derivative<N> {
    fn output_order(&self, input_order: usize) -> usize {
        input_order.saturating_sub(N)
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        spline.derivative(N)
    }
}

/// The position operator of degree `N`, multiplying a spline by `x^N`. It
/// raises the polynomial order by `N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position<const N: usize>;

impl<T: RealField + Copy, const N: usize> SplineOperator<T> for Position<N> {
    fn output_order(&self, input_order: usize) -> usize {
        input_order + N
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        let mut result = spline.clone();
        for _ in 0..N {
            result = result.times_x();
        }
        result
    }
}

/// An operator scaled by a scalar factor.
///
/// ```
/// use bspline_algebra::operators::{Position, ScaledOperator};
/// // The operator x^2 / 2.
/// let _operator = ScaledOperator::new(0.5, Position::<2>);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScaledOperator<T, O> {
    factor: T,
    operator: O,
}

impl<T, O> ScaledOperator<T, O> {
    pub fn new(factor: T, operator: O) -> Self {
        ScaledOperator { factor, operator }
    }
}

impl<T, O> SplineOperator<T> for ScaledOperator<T, O>
where
    T: RealField + Copy,
    O: SplineOperator<T>,
{
    fn output_order(&self, input_order: usize) -> usize {
        self.operator.output_order(input_order)
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        self.operator.apply(spline).scaled(self.factor)
    }
}

/// The sum of two operators. Applying the sum is equivalent to applying both
/// terms and summing the results.
#[derive(Debug, Clone, Copy)]
pub struct OperatorSum<A, B> {
    left: A,
    right: B,
}

impl<A, B> OperatorSum<A, B> {
    pub fn new(left: A, right: B) -> Self {
        OperatorSum { left, right }
    }
}

impl<T, A, B> SplineOperator<T> for OperatorSum<A, B>
where
    T: RealField + Copy,
    A: SplineOperator<T>,
    B: SplineOperator<T>,
{
    fn output_order(&self, input_order: usize) -> usize {
        self.left
            .output_order(input_order)
            .max(self.right.output_order(input_order))
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        self.left.apply(spline).merge_add(&self.right.apply(spline))
    }
}

/// The composition of two operators, applied right to left:
/// `(outer ∘ inner)(s) = outer(inner(s))`. Composing two position operators
/// adds their degrees.
#[derive(Debug, Clone, Copy)]
pub struct OperatorProduct<A, B> {
    outer: A,
    inner: B,
}

impl<A, B> OperatorProduct<A, B> {
    pub fn new(outer: A, inner: B) -> Self {
        OperatorProduct { outer, inner }
    }
}

impl<T, A, B> SplineOperator<T> for OperatorProduct<A, B>
where
    T: RealField + Copy,
    A: SplineOperator<T>,
    B: SplineOperator<T>,
{
    fn output_order(&self, input_order: usize) -> usize {
        self.outer.output_order(self.inner.output_order(input_order))
    }

    fn apply(&self, spline: &Spline<T>) -> Spline<T> {
        self.outer.apply(&self.inner.apply(spline))
    }
}
