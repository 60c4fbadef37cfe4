//! Operations shared by the 1D, 2D and 3D splines.
//!
//! This module provides the [`EquidistantSpline`] trait. Evaluation has a
//! dimension-specific signature and lives on the concrete types; weight
//! access, the order-changing transforms, snapshots, comparisons and the
//! text format are common.

use crate::{carrier::Carrier, SplineError, SplineResult};
use std::{
    fs::File,
    io::{BufReader, BufWriter, BufRead, Write},
    path::Path,
};
use tracing::warn;

/// A coordinate axis of a tensor-product spline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Position of the axis in `(x, y, z)`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    #[inline]
    pub fn tag(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    /// Error unless this axis exists in `dims` dimensions.
    #[inline]
    pub(crate) fn check(self, dims: usize) -> SplineResult<()> {
        if self.index() < dims {
            Ok(())
        } else {
            Err(SplineError::InvalidAxis {
                axis: self.tag(),
                dims,
            })
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = SplineError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag {
            'x' | 'X' => Ok(Axis::X),
            'y' | 'Y' => Ok(Axis::Y),
            'z' | 'Z' => Ok(Axis::Z),
            _ => Err(SplineError::InvalidAxis { axis: tag, dims: 3 }),
        }
    }
}

/// Trait for equidistant tensor-product B-spline functions.
///
/// Mutating a weight does not refresh derived data by itself; call
/// [`complete`](Self::complete) afterwards. Every other mutating method
/// commits on its own.
pub trait EquidistantSpline: Sized {
    /// Number of axes.
    const DIMENSIONS: usize;

    /// Plain-data copy of the persistent state.
    type Snapshot;

    /// Carrier of `axis`.
    fn carrier(&self, axis: Axis) -> SplineResult<&Carrier>;

    /// All weights, in the layout of the concrete type.
    fn weights(&self) -> &[f64];

    /// Sets one weight. Call [`complete`](Self::complete) when done.
    fn set_weight(&mut self, index: usize, value: f64) -> SplineResult<()>;

    /// Replaces all weights and commits.
    fn set_weights(&mut self, values: &[f64]) -> SplineResult<()>;

    /// Recomputes derived data after weight or carrier mutations.
    fn complete(&mut self);

    /// Scales the function by `value`.
    fn multiply(&mut self, value: f64);

    /// Replaces the function by its partial derivative along `axis`.
    ///
    /// The order along `axis` drops by one; an order 1 axis yields the zero
    /// function.
    fn differentiate_along(&mut self, axis: Axis) -> SplineResult<()>;

    /// Replaces the function by its antiderivative along `axis` taking
    /// `value` at `at`.
    ///
    /// Does nothing if the order along `axis` is already at its maximum.
    fn integrate_along(
        &mut self,
        axis: Axis,
        at: f64,
        value: f64,
    ) -> SplineResult<()>;

    /// A copy differentiated along `axis`.
    fn derivative_along(&self, axis: Axis) -> SplineResult<Self>
    where
        Self: Clone,
    {
        let mut derived = self.clone();
        derived.differentiate_along(axis)?;
        Ok(derived)
    }

    fn snapshot(&self) -> Self::Snapshot;

    /// Restores a snapshot; on error `self` is unchanged.
    fn restore(&mut self, snapshot: &Self::Snapshot) -> SplineResult<()>;

    /// Exact equality of carriers, weights and boundary data.
    fn is_static_data_equal(&self, other: &Self) -> bool;

    /// Equality with every compared quantity within `max_delta`.
    fn is_approximated_equal(&self, other: &Self, max_delta: f64) -> bool;

    /// Reads the text format. Returns `false` if a required field is
    /// missing or inconsistent; `self` is then unchanged.
    fn load<R: BufRead>(&mut self, reader: R) -> bool;

    /// Writes the text format with every field prefixed by `path`.
    fn save<W: Write>(&self, writer: W, path: &str) -> bool;

    #[inline]
    fn number_of_weights(&self) -> usize {
        self.weights().len()
    }

    #[inline]
    fn weight(&self, index: usize) -> Option<f64> {
        self.weights().get(index).copied()
    }

    /// Arithmetic mean of all weights.
    fn weight_mean(&self) -> f64 {
        let weights = self.weights();
        weights.iter().sum::<f64>() / weights.len() as f64
    }

    /// Loads the text format from a file.
    fn load_file<P: AsRef<Path>>(&mut self, path: P) -> bool {
        match File::open(path.as_ref()) {
            Ok(file) => self.load(BufReader::new(file)),
            Err(err) => {
                warn!(path = %path.as_ref().display(), %err, "cannot open spline file");
                false
            }
        }
    }

    /// Saves the text format to a file, naming the spline `name`.
    fn save_file<P: AsRef<Path>>(&self, path: P, name: &str) -> bool {
        match File::create(path.as_ref()) {
            Ok(file) => self.save(BufWriter::new(file), name),
            Err(err) => {
                warn!(path = %path.as_ref().display(), %err, "cannot create spline file");
                false
            }
        }
    }
}
