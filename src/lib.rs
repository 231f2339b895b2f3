//! Library for piecewise polynomial splines defined over a fixed numeric
//! grid. It provides B-spline basis generation via the Cox-de Boor
//! recursion, spline algebra (sum, product, differentiation, evaluation),
//! closed form and numerical integration of spline products, and
//! solver-backed interpolation.
//!
//! All splines of one computation share a [Grid], and each spline addresses
//! the part of the grid it lives on through a [Support]. Combining splines
//! from differing grids fails instead of resampling.
//!
//! # Example
//! ```
//! use bspline_algebra::{integration, BSplineGenerator};
//! use assert_approx_eq::assert_approx_eq;
//!
//! let generator = BSplineGenerator::new(vec![0.0_f64, 1.0, 2.0, 3.0]).unwrap();
//! let basis = generator.generate_all(3).unwrap();
//!
//! assert_eq!(1, basis.len());
//! assert_approx_eq!(0.75, basis[0].eval(1.5), 1e-15);
//! assert_approx_eq!(1.0, integration::integrate(&basis[0]), 1e-15);
//! ```

mod error;
mod generator;
mod grid;
mod spline;
mod support;

pub mod integration;
pub mod interpolation;
pub mod operators;

pub use error::{Result, SplineError};
pub use generator::BSplineGenerator;
pub use grid::Grid;
pub use spline::Spline;
pub use support::Support;
