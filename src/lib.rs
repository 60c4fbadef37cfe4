//! Equidistant tensor-product B-spline functions.
//!
//! A spline of order `K` on `[A, B]` with `N` equidistant intervals is a
//! piecewise polynomial of degree `K - 1` defined by `N + K - 1` weights.
//! This crate evaluates such splines in one, two and three dimensions,
//! differentiates and integrates them (changing the order), extrapolates
//! them outside their domain with boundary Taylor polynomials, and inverts
//! them numerically.
//!
//! * [`BSpline1`] – functions of one variable, with inversion.
//! * [`BSpline2`] – functions of two variables.
//! * [`BSpline3`] – functions of three variables, evaluated along X through
//!   a lazily built [`ProfileCache`] for a preset `(y, z)`.
//!
//! All three share the [`EquidistantSpline`] trait for weight access,
//! calculus along an [`Axis`], snapshots, comparison and a line-oriented
//! text format.
//!
//! # Examples
//! ```
//! use equidistant_bsplines::prelude::*;
//!
//! let mut spline = BSpline1::new(16, 4)?;
//! spline.set_carrier(0.0, 2.0, 2, 2, BoundaryCondition::Full, BoundaryCondition::Full)?;
//! spline.set_weights(&[1.0, 2.0, 3.0])?;
//!
//! assert_eq!(spline.evaluate(0.5), 1.5);
//! // Outside the domain the line continues.
//! assert_eq!(spline.evaluate(3.0), 4.0);
//!
//! spline.integrate(0.0, 0.0);
//! assert_eq!(spline.order(), 3);
//! assert!((spline.evaluate(2.0) - 4.0).abs() < 1e-12);
//! # Ok::<(), SplineError>(())
//! ```
//!
//! # Sample points
//!
//! The [`interp`] module holds simple interpolants over tabulated points
//! that do not use carriers or weights: natural/clamped cubic splines,
//! piecewise-linear interpolation on arbitrary or evenly spaced nodes and
//! cosine-warped resampling.
//!
//! # Feature flags
#![doc = document_features::document_features!()]

mod carrier;
mod error;
mod format;
pub mod interp;
mod invert;
mod lanes;
mod snapshot;
mod spline1;
mod spline2;
mod spline3;
mod spline_trait;
mod taylor;

pub use carrier::{Carrier, Edge, Position};
pub use error::{SplineError, SplineResult};
pub use format::{FieldReader, FieldWriter};
pub use invert::{
    illinois, secant_retained, InverseOptions, ILLINOIS_ITERATIONS,
    SECANT_ITERATIONS,
};
pub use snapshot::{CarrierData, Snapshot1, Snapshot2, Snapshot3};
pub use spline1::BSpline1;
pub use spline2::BSpline2;
pub use spline3::{BSpline3, ProfileCache};
pub use spline_trait::{Axis, EquidistantSpline};
pub use taylor::{BoundaryCondition, TaylorOrders, TaylorPoly};

/// Highest supported order on any axis (polynomial degree 5).
pub const MAX_ORDER: usize = 6;

/// Default residual tolerance of the inverse solvers.
pub const DELTA: f64 = 1e-8;

/// Longest spline path, plus terminator, the text format accepts when
/// saving.
pub const PATH_BUDGET: usize = 256;

pub mod prelude {
    //! Everything needed to build, evaluate and persist splines.
    pub use crate::{
        Axis, BSpline1, BSpline2, BSpline3, BoundaryCondition, Carrier,
        EquidistantSpline, InverseOptions, SplineError, SplineResult,
        TaylorOrders,
    };
}
