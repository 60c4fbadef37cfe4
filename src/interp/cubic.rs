use super::SortedPoints;
use crate::SplineResult;

/// Interpolating cubic spline with natural or clamped ends.
///
/// # Examples
/// ```
/// use equidistant_bsplines::interp::CubicSpline;
///
/// let spline = CubicSpline::natural(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0])?;
/// assert_eq!(spline.evaluate(1.0), 1.0);
/// assert_eq!(spline.evaluate(0.5), 0.6875);
/// # Ok::<(), equidistant_bsplines::SplineError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    points: SortedPoints,
    d2y: Vec<f64>,
}

impl CubicSpline {
    /// Natural spline: zero second derivative at both ends.
    pub fn natural(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        Self::new(xs, ys, None, None)
    }

    /// Spline with prescribed first derivatives at both ends.
    pub fn clamped(
        xs: &[f64],
        ys: &[f64],
        dy_lower: f64,
        dy_upper: f64,
    ) -> SplineResult<Self> {
        Self::new(xs, ys, Some(dy_lower), Some(dy_upper))
    }

    /// An end slope of `None` makes that end natural.
    pub fn new(
        xs: &[f64],
        ys: &[f64],
        dy_lower: Option<f64>,
        dy_upper: Option<f64>,
    ) -> SplineResult<Self> {
        let points = SortedPoints::new(xs, ys)?;
        points.require(2)?;
        let d2y = second_derivatives(points.xs(), points.ys(), dy_lower, dy_upper);
        Ok(Self { points, d2y })
    }

    #[inline]
    pub fn points(&self) -> &SortedPoints {
        &self.points
    }

    /// Second derivatives at the sample points.
    #[inline]
    pub fn second_derivatives(&self) -> &[f64] {
        &self.d2y
    }

    /// First point of the segment at `x` and, unless the segment is
    /// degenerate, its width `h` with the weights `a + b == 1`.
    #[inline]
    fn locate(&self, x: f64) -> (usize, Option<(f64, f64, f64)>) {
        let xs = self.points.xs();
        let lo = self.points.segment(x);
        let h = xs[lo + 1] - xs[lo];
        if h > self.points.epsilon() {
            let a = (xs[lo + 1] - x) / h;
            let b = (x - xs[lo]) / h;
            (lo, Some((h, a, b)))
        } else {
            (lo, None)
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let ys = self.points.ys();
        let d2 = &self.d2y;
        match self.locate(x) {
            (lo, Some((h, a, b))) => {
                a * ys[lo]
                    + b * ys[lo + 1]
                    + ((a * a * a - a) * d2[lo] + (b * b * b - b) * d2[lo + 1]) * h * h
                        / 6.0
            }
            (lo, None) => 0.5 * (ys[lo] + ys[lo + 1]),
        }
    }

    /// First derivative; zero on a degenerate segment.
    pub fn derivative(&self, x: f64) -> f64 {
        let ys = self.points.ys();
        let d2 = &self.d2y;
        match self.locate(x) {
            (lo, Some((h, a, b))) => {
                (ys[lo + 1] - ys[lo]) / h - (3.0 * a * a - 1.0) / 6.0 * h * d2[lo]
                    + (3.0 * b * b - 1.0) / 6.0 * h * d2[lo + 1]
            }
            (_, None) => 0.0,
        }
    }

    pub fn second_derivative(&self, x: f64) -> f64 {
        let d2 = &self.d2y;
        match self.locate(x) {
            (lo, Some((_, a, b))) => a * d2[lo] + b * d2[lo + 1],
            (lo, None) => 0.5 * (d2[lo] + d2[lo + 1]),
        }
    }

    pub fn third_derivative(&self, x: f64) -> f64 {
        let d2 = &self.d2y;
        match self.locate(x) {
            (lo, Some((h, _, _))) => (d2[lo + 1] - d2[lo]) / h,
            (_, None) => 0.0,
        }
    }
}

/// Tridiagonal solve for the second derivatives at the sample points.
fn second_derivatives(
    xs: &[f64],
    ys: &[f64],
    dy_lower: Option<f64>,
    dy_upper: Option<f64>,
) -> Vec<f64> {
    let n = xs.len();
    let mut d2 = vec![0.0; n];
    let mut u = vec![0.0; n - 1];

    if let Some(dy) = dy_lower {
        let h = xs[1] - xs[0];
        d2[0] = -0.5;
        u[0] = 3.0 / h * ((ys[1] - ys[0]) / h - dy);
    }

    for i in 1..n - 1 {
        let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
        let p = sig * d2[i - 1] + 2.0;
        d2[i] = (sig - 1.0) / p;
        let slope_change = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
            - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
        u[i] = (6.0 * slope_change / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
    }

    let (qn, un) = match dy_upper {
        Some(dy) => {
            let h = xs[n - 1] - xs[n - 2];
            (0.5, 3.0 / h * (dy - (ys[n - 1] - ys[n - 2]) / h))
        }
        None => (0.0, 0.0),
    };

    d2[n - 1] = (un - qn * u[n - 2]) / (qn * d2[n - 2] + 1.0);
    for k in (0..n - 1).rev() {
        d2[k] = d2[k] * d2[k + 1] + u[k];
    }
    d2
}
