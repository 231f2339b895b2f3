use thiserror::Error;

/// Crate wide result type.
pub type Result<T, E = SplineError> = std::result::Result<T, E>;

/// Errors reported by grid, support, spline, generator, integration and
/// interpolation operations.
///
/// All of these are unrecoverable at the point of detection and are surfaced
/// to the caller immediately; nothing is retried internally.
#[derive(Debug, Error)]
pub enum SplineError {
    /// A grid was constructed from values that are not strictly increasing.
    #[error("grid values are not strictly increasing")]
    InvalidGrid,

    /// Two entities defined on inequivalent grids were combined. The
    /// operation fails fast, it never re-grids or resamples.
    #[error("operands are defined on differing grids")]
    DifferingGrids,

    /// Supplied data contradicts data derived from other inputs, e.g. an
    /// externally supplied grid that does not match the grid derived from a
    /// knot sequence.
    #[error("inconsistent data: {0}")]
    InconsistentData(String),

    /// A requested construction is mathematically degenerate, e.g. a knot
    /// interval of zero width or too few knots for the requested order.
    #[error("construction is undetermined: {0}")]
    Undetermined(String),

    /// A checked access beyond support or grid bounds.
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
