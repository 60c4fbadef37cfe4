//! Interpolants over sorted sample points.
//!
//! These do not use carriers or weights. They interpolate tabulated
//! `(x, y)` data directly and share only the [`SortedPoints`] container.

mod cubic;
mod equidistant_linear;
mod gauss_lobatto;
mod linear;

pub use cubic::CubicSpline;
pub use equidistant_linear::{EquidistantLinearSpline, EQUIDISTANCE_TOLERANCE};
pub use gauss_lobatto::{GaussLobattoSpline, Spacing};
pub use linear::LinearSpline;

use crate::{SplineError, SplineResult};

/// Scale of the abscissa tolerance relative to the largest `|x|` at the
/// ends of the table.
pub const EPSILON_SCALE: f64 = 1e-11;

/// Sample points sorted by abscissa.
///
/// Sorting is stable, so points with equal abscissae keep their input
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortedPoints {
    xs: Vec<f64>,
    ys: Vec<f64>,
    epsilon: f64,
}

impl SortedPoints {
    /// Sorts `(xs[i], ys[i])` by abscissa.
    pub fn new(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        if xs.len() != ys.len() {
            return Err(SplineError::SizeMismatch {
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Ok(Self::from_parts(xs, ys))
    }

    /// Takes `xs` as already sorted.
    pub fn from_sorted(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        if xs.len() != ys.len() {
            return Err(SplineError::SizeMismatch {
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        debug_assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        Ok(Self::from_parts(xs.to_vec(), ys.to_vec()))
    }

    /// All points carry the same `value`.
    pub fn constant(xs: &[f64], value: f64) -> Self {
        let mut xs = xs.to_vec();
        xs.sort_by(f64::total_cmp);
        let ys = vec![value; xs.len()];
        Self::from_parts(xs, ys)
    }

    fn from_parts(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let epsilon = match (xs.first(), xs.last()) {
            (Some(first), Some(last)) => EPSILON_SCALE * first.abs().max(last.abs()),
            _ => EPSILON_SCALE,
        };
        Self { xs, ys, epsilon }
    }

    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Replaces the ordinates, keeping the abscissae.
    pub fn set_ys(&mut self, ys: &[f64]) -> SplineResult<()> {
        if ys.len() != self.ys.len() {
            return Err(SplineError::SizeMismatch {
                expected: self.ys.len(),
                actual: ys.len(),
            });
        }
        self.ys.copy_from_slice(ys);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[inline]
    pub fn x_min(&self) -> Option<f64> {
        self.xs.first().copied()
    }

    #[inline]
    pub fn x_max(&self) -> Option<f64> {
        self.xs.last().copied()
    }

    /// Intervals shorter than this are treated as degenerate.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Index of the last point with abscissa `<= x`, or `0` if `x` lies
    /// below all points. `None` for an empty table.
    pub fn index_from_value(&self, x: f64) -> Option<usize> {
        if self.xs.is_empty() {
            return None;
        }
        Some(self.xs.partition_point(|&xi| xi <= x).saturating_sub(1))
    }

    /// First point of the segment used at `x`; the end segments extend to
    /// infinity.
    ///
    /// Requires at least two points.
    #[inline]
    pub(crate) fn segment(&self, x: f64) -> usize {
        debug_assert!(self.xs.len() >= 2);
        self.index_from_value(x)
            .unwrap_or(0)
            .min(self.xs.len() - 2)
    }

    /// Fails on the first segment no wider than [`epsilon`](Self::epsilon).
    pub(crate) fn require_distinct(&self) -> SplineResult<()> {
        match self
            .xs
            .windows(2)
            .find(|w| w[1] - w[0] <= self.epsilon)
        {
            Some(w) => Err(SplineError::DuplicateAbscissa { x: w[1] }),
            None => Ok(()),
        }
    }

    pub(crate) fn require(&self, required: usize) -> SplineResult<()> {
        if self.len() < required {
            Err(SplineError::InsufficientPoints {
                required,
                actual: self.len(),
            })
        } else {
            Ok(())
        }
    }
}
