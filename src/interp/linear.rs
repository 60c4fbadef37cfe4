use super::SortedPoints;
use crate::SplineResult;

/// Piecewise-linear interpolation. Outside the table the end segments are
/// extended.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSpline {
    points: SortedPoints,
}

impl LinearSpline {
    pub fn new(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        let points = SortedPoints::new(xs, ys)?;
        points.require(2)?;
        Ok(Self { points })
    }

    #[inline]
    pub fn points(&self) -> &SortedPoints {
        &self.points
    }

    /// Replaces the ordinates.
    pub fn set_values(&mut self, ys: &[f64]) -> SplineResult<()> {
        self.points.set_ys(ys)
    }

    /// Value at `x`. A degenerate segment yields the mean of its ends.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (xs, ys) = (self.points.xs(), self.points.ys());
        let n = self.points.segment(x);
        let h = xs[n + 1] - xs[n];
        if h > self.points.epsilon() {
            ys[n] + (ys[n + 1] - ys[n]) * (x - xs[n]) / h
        } else {
            0.5 * (ys[n] + ys[n + 1])
        }
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}
