//! Error types for spline setup and manipulation.

use thiserror::Error;

/// Errors that can occur while setting up or mutating a spline.
///
/// Evaluation never fails: outside the domain the boundary Taylor
/// polynomials take over. Text load/save report failure through their
/// `bool` return value instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    /// The lower bound of a domain is not strictly below the upper bound.
    #[error("domain lower bound {lower} must be less than upper bound {upper}")]
    InvalidDomain { lower: f64, upper: f64 },

    /// The interval count is zero or exceeds the configured capacity.
    #[error("interval count must be in 1..={max}. Found: {n}")]
    InvalidIntervals { n: usize, max: usize },

    /// The order is zero or exceeds the configured capacity.
    #[error("order must be in 1..={max}. Found: {k}")]
    InvalidOrder { k: usize, max: usize },

    /// A capacity asked for more than [`MAX_ORDER`](crate::MAX_ORDER).
    #[error("maximum order {max_order} exceeds the total limit of {limit}")]
    MaxOrderTooLarge { max_order: usize, limit: usize },

    /// A weight buffer has the wrong number of elements.
    #[error("expected {expected} weights. Found: {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A weight index is outside the active weights.
    #[error("weight index {index} is out of range for {len} weights")]
    WeightIndexOutOfRange { index: usize, len: usize },

    /// A boundary-condition tag is neither `'s'`, `'a'` nor a digit.
    #[error("unknown boundary condition tag {0:?}")]
    InvalidBoundaryTag(char),

    /// The axis does not exist for a spline of this dimensionality.
    #[error("axis {axis} is not available on a {dims}-dimensional spline")]
    InvalidAxis { axis: char, dims: usize },

    /// An interpolant was given too few points.
    #[error("at least {required} points are required. Found: {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// Two sample points share an abscissa where distinct ones are needed.
    #[error("abscissa {x} appears more than once")]
    DuplicateAbscissa { x: f64 },

    /// Sample abscissae are not evenly spaced.
    #[error("abscissae are not equidistant: step {step} differs from {expected}")]
    NotEquidistant { step: f64, expected: f64 },

    /// An argument is outside the range an interpolant was built for.
    #[error("argument {value} is outside [{lower}, {upper}]")]
    ArgumentOutOfRange { value: f64, lower: f64, upper: f64 },
}

/// Result type for spline operations.
pub type SplineResult<T> = Result<T, SplineError>;
